use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::{Authenticator, SessionClaims};
use crate::error::{ConfigurationError, TokenError};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_DELIMITER: char = ':';

const MIN_TOKEN_VALIDITY_SECS: i64 = 60;
const MAX_TOKEN_VALIDITY_SECS: i64 = 365 * 24 * 3600;
const SIGNATURE_HEX_LEN: usize = 64;
const MIN_SECRET_LEN: usize = 32;
const MIN_COOKIE_NAME_LEN: usize = 8;
const MIN_USERNAME_LEN: usize = 4;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub secret_key: String,
    pub cookie_name: String,
    pub token_validity_secs: i64,
}

/// Issues and checks `username:expiry:signature` session tokens.
///
/// The signature is the hex HMAC-SHA256 of `username:expiry` keyed by the
/// secret. Nothing is stored server side: a token is valid until its expiry.
pub struct TokenAuthenticator {
    username: String,
    password: String,
    secret_key: String,
    cookie_name: String,
    token_validity_secs: i64,
}

impl TokenAuthenticator {
    pub fn new(config: AuthConfig) -> Result<Self, ConfigurationError> {
        let AuthConfig { username, password, secret_key, cookie_name, token_validity_secs } = config;

        if username.is_empty() || password.is_empty() || secret_key.is_empty() || cookie_name.is_empty() {
            return Err(ConfigurationError::EmptyField);
        }
        if token_validity_secs < MIN_TOKEN_VALIDITY_SECS {
            return Err(ConfigurationError::ValidityTooShort { min: MIN_TOKEN_VALIDITY_SECS });
        }
        if token_validity_secs > MAX_TOKEN_VALIDITY_SECS {
            return Err(ConfigurationError::ValidityTooLong { max: MAX_TOKEN_VALIDITY_SECS });
        }
        if secret_key.len() < MIN_SECRET_LEN {
            return Err(ConfigurationError::SecretTooShort { min: MIN_SECRET_LEN });
        }
        if cookie_name.len() < MIN_COOKIE_NAME_LEN {
            return Err(ConfigurationError::CookieNameTooShort { min: MIN_COOKIE_NAME_LEN });
        }
        if cookie_name.contains(TOKEN_DELIMITER) {
            return Err(ConfigurationError::CookieNameHasDelimiter);
        }
        if username.contains(TOKEN_DELIMITER) {
            return Err(ConfigurationError::UsernameHasDelimiter);
        }
        if username == password {
            return Err(ConfigurationError::UsernameEqualsPassword);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigurationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }
        if username.len() < MIN_USERNAME_LEN {
            return Err(ConfigurationError::UsernameTooShort { min: MIN_USERNAME_LEN });
        }

        Ok(TokenAuthenticator {
            username,
            password,
            secret_key,
            cookie_name,
            token_validity_secs,
        })
    }

    pub fn token_validity_secs(&self) -> i64 {
        self.token_validity_secs
    }

    pub fn validate_credentials(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }

    pub fn generate_token(&self, username: &str, expiry: i64) -> String {
        let data = format!("{}{}{}", username, TOKEN_DELIMITER, expiry);
        let signature = hex::encode(self.mac_for(&data).finalize().into_bytes());
        format!("{}{}{}", data, TOKEN_DELIMITER, signature)
    }

    /// Token for the configured user, expiring `token_validity_secs` from now.
    pub fn issue_token(&self) -> Result<(String, i64), TokenError> {
        let expiry = Utc::now().timestamp()
            .checked_add(self.token_validity_secs)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        Ok((self.generate_token(&self.username, expiry), expiry))
    }

    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let parts: Vec<&str> = token.split(TOKEN_DELIMITER).collect();
        let [username, expiry_str, signature] = parts.as_slice() else {
            return Err(TokenError::Malformed);
        };

        let expiry: i64 = expiry_str.parse().map_err(|_| TokenError::InvalidExpiry)?;
        if now > expiry {
            return Err(TokenError::Expired);
        }

        // Only the exact lowercase hex we emit is accepted
        if !is_lower_hex_signature(signature) {
            return Err(TokenError::InvalidSignature);
        }

        // Recomputed over the received expiry text, not a re-formatted number
        let data = format!("{}{}{}", username, TOKEN_DELIMITER, expiry_str);
        let provided = hex::decode(signature).map_err(|_| TokenError::InvalidSignature)?;
        self.mac_for(&data)
            .verify_slice(&provided)
            .map_err(|_| TokenError::InvalidSignature)?;

        Ok(SessionClaims {
            username: username.to_string(),
            expiry,
        })
    }

    fn mac_for(&self, data: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(data.as_bytes());
        mac
    }
}

fn is_lower_hex_signature(signature: &str) -> bool {
    signature.len() == SIGNATURE_HEX_LEN
        && signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl Authenticator for TokenAuthenticator {
    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn validate_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.validate_token_at(token, Utc::now().timestamp())
    }
}
