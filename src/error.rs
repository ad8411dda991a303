use std::io;

use thiserror::Error;

/// Invalid authentication parameters. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("username, password, secret key and cookie name are required")]
    EmptyField,
    #[error("token validity must be at least {min} seconds")]
    ValidityTooShort { min: i64 },
    #[error("token validity must be at most {max} seconds")]
    ValidityTooLong { max: i64 },
    #[error("secret key must be at least {min} characters")]
    SecretTooShort { min: usize },
    #[error("cookie name must be at least {min} characters")]
    CookieNameTooShort { min: usize },
    #[error("cookie name cannot contain ':'")]
    CookieNameHasDelimiter,
    #[error("username cannot contain ':'")]
    UsernameHasDelimiter,
    #[error("username and password must be different")]
    UsernameEqualsPassword,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("empty token")]
    Empty,
    #[error("malformed token")]
    Malformed,
    #[error("invalid expiry")]
    InvalidExpiry,
    #[error("expired token")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("expiry out of range")]
    ExpiryOutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title, content and slug are required")]
    MissingField,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("title must be at least {min} characters")]
    TitleTooShort { min: usize },
    #[error("slug must be at most {max} characters")]
    SlugTooLong { max: usize },
    #[error("slug must be at least {min} characters")]
    SlugTooShort { min: usize },
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("a post with slug {0} already exists")]
    DuplicateSlug(String),
    #[error("storage i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("storage write was canceled")]
    Canceled,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("error parsing markdown: {0}")]
    Markdown(String),
    #[error("error parsing template {name}: {reason}")]
    Template { name: &'static str, reason: String },
}

/// Failure of a single write workflow. Aborts the request, never the process.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
