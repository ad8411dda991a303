use std::sync::Arc;

use ntex::http::header;
use ntex::web::HttpRequest;
use spdlog::{debug, info};

use crate::auth::session_cookie::find_cookie;
use crate::auth::Authenticator;
use crate::error::TokenError;

/// Outcome of checking a request for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Anonymous,
    Authenticated(String),
    Invalid(TokenError),
}

impl AuthDecision {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthDecision::Authenticated(_))
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthDecision::Authenticated(username) => Some(username.as_str()),
            _ => None,
        }
    }
}

/// Decides per request whether the caller is the author.
///
/// Read paths only use the decision to toggle edit controls; write paths
/// must see `Authenticated` or redirect. Tokens are not checked against any
/// revocation list.
#[derive(Clone)]
pub struct AuthorizationGate {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthorizationGate {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        AuthorizationGate { authenticator }
    }

    pub fn cookie_name(&self) -> &str {
        self.authenticator.cookie_name()
    }

    pub fn check(&self, req: &HttpRequest) -> AuthDecision {
        let cookie_header = req.headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());
        self.check_cookie_header(cookie_header)
    }

    pub fn check_cookie_header(&self, cookie_header: Option<&str>) -> AuthDecision {
        let cookie_name = self.authenticator.cookie_name();
        let Some(token) = cookie_header.and_then(|h| find_cookie(h, cookie_name)) else {
            debug!("No {} cookie, anonymous request", cookie_name);
            return AuthDecision::Anonymous;
        };

        match self.authenticator.validate_token(&token) {
            Ok(claims) => {
                debug!("Authenticated as {}", claims.username);
                AuthDecision::Authenticated(claims.username)
            }
            Err(err) => {
                info!("Rejected session cookie: {}", err);
                AuthDecision::Invalid(err)
            }
        }
    }
}
