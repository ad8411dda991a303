use crate::error::TokenError;

pub mod gate;
pub mod session_cookie;
pub mod token_auth;

/// Identity carried by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    pub expiry: i64,
}

/// What the authorization gate needs from a token issuer.
pub trait Authenticator: Send + Sync {
    fn cookie_name(&self) -> &str;
    fn validate_token(&self, token: &str) -> Result<SessionClaims, TokenError>;
}
