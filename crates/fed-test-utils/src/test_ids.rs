//! Fixed test identifiers for deterministic tests

// Hosting service
pub const TEST_BASE_URL: &str = "https://fedbox.example";
pub const TEST_SERVICE_INBOX: &str = "https://fedbox.example/inbox";
pub const TEST_OAUTH_AUTHORIZE: &str = "https://fedbox.example/oauth/authorize";
pub const TEST_OAUTH_TOKEN: &str = "https://fedbox.example/oauth/token";

// Actors
pub const TEST_ACTOR_ALICE: &str = "https://fedbox.example/actors/alice";
pub const TEST_ACTOR_ALICE_KEY: &str = "https://fedbox.example/actors/alice#main-key";
pub const TEST_USERNAME_ALICE: &str = "alice";
pub const TEST_USERNAME_BOB: &str = "bob";

// Bearer tokens
pub const TEST_TOKEN_VALID: &str = "valid-token";
pub const TEST_TOKEN_EXPIRED: &str = "expired-token";

// OAuth2 clients
pub const TEST_CLIENT_SECRET: &str = "test-secret-do-not-use-in-production";
pub const TEST_REDIRECT_A: &str = "https://a";
pub const TEST_REDIRECT_B: &str = "https://b";
