use serde::{Deserialize, Serialize};

/// Longest username and password a login form submission may carry. The
/// configured credentials are held to the same limits at startup.
pub const MAX_USERNAME_LEN: usize = 64;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Payload of the signed session cookie. Possession of a valid, unexpired
/// token is what makes a client `Authenticated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Outcome of a credential check.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated { token: String },
    Rejected,
}
