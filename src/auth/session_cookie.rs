use cookie::time::OffsetDateTime;
use cookie::Cookie;

use crate::error::TokenError;

/// `Set-Cookie` value carrying a session token until `expiry` (unix seconds).
pub fn session_cookie(name: &str, token: &str, expiry: i64) -> Result<String, TokenError> {
    let expires = OffsetDateTime::from_unix_timestamp(expiry)
        .map_err(|_| TokenError::ExpiryOutOfRange)?;
    Ok(Cookie::build((name.to_string(), token.to_string()))
        .path("/")
        .http_only(true)
        .expires(expires)
        .build()
        .to_string())
}

/// Same cookie name with an already elapsed lifetime, so the browser drops it.
pub fn expired_session_cookie(name: &str) -> String {
    Cookie::build((name.to_string(), String::new()))
        .path("/")
        .http_only(true)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(cookie::time::Duration::ZERO)
        .build()
        .to_string()
}

/// Value of the first cookie called `name` in a `Cookie` request header.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}
