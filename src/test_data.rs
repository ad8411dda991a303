#![cfg(test)]

use chrono::{Duration, FixedOffset, TimeZone};

use crate::auth::token_auth::AuthConfig;
use crate::auth::{Authenticator, SessionClaims};
use crate::config::{parse_config, Config};
use crate::error::TokenError;
use crate::storage::NewPost;

pub const POST_CONTENT_MD: &str = "# What I learned after 20+ years of software development
How to be a great software engineer?

Someone asked me this question today and I didn't have an answer. After thinking for a while, I came up with a list of what I try to do myself.

I will divide this in parts, non-technical and technical...

## Non technical

### Have a honest image of yourself

You finished university and learned a lot. You solved many hard problems.
Some day in your life, you will find that there are many developers much better than you. __The earlier you find that, the better.__

## Technical

| Practice | Why |
|----------|-----|
| Tests    | Confidence |
| Reviews  | ~~Speed~~ Quality |

```rust
fn main() {
    println!(\"hello\");
}
```

## Technical

Yes, the same heading again. See https://example.com for more.
";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        username: "admin".to_string(),
        password: "correct-horse-battery".to_string(),
        secret_key: "0123456789abcdef0123456789abcdef-test".to_string(),
        cookie_name: "blogo_session".to_string(),
        token_validity_secs: 3600,
    }
}

const TEST_CONFIG: &str = r#"
[blog]
name = "Blogo"
title = "Test blog"
utc_offset = "-03:00"
page_size = 2

[auth]
username = "admin"
password = "correct-horse-battery"
secret_key = "0123456789abcdef0123456789abcdef-test"
cookie_name = "blogo_session"
token_validity_secs = 3600

[paths]
public_dir = "res/public"

[server]
address = "127.0.0.1"
port = 8001
"#;

/// Same credentials as [`auth_config`], in-memory data.
pub fn config() -> Config {
    parse_config(TEST_CONFIG).unwrap()
}

pub fn utc_minus_3() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

/// A valid post created `minutes` after a fixed instant.
pub fn new_post(slug: &str, minutes: i64) -> NewPost {
    let created_at = utc_minus_3().with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + Duration::minutes(minutes);
    NewPost {
        title: format!("Post {}", slug),
        slug: slug.to_string(),
        content: "Some *markdown*".to_string(),
        parsed_content: "<p>Some <em>markdown</em></p>".to_string(),
        toc: String::new(),
        description: String::new(),
        read_time_minutes: 1,
        created_at,
        modified_at: created_at,
    }
}

/// Authenticator with a fixed answer, whatever the token.
pub struct MockAuthenticator {
    outcome: Result<SessionClaims, TokenError>,
}

impl MockAuthenticator {
    pub fn accepting() -> Self {
        MockAuthenticator {
            outcome: Ok(SessionClaims {
                username: "admin".to_string(),
                expiry: i64::MAX,
            }),
        }
    }

    pub fn rejecting() -> Self {
        MockAuthenticator {
            outcome: Err(TokenError::InvalidSignature),
        }
    }
}

impl Authenticator for MockAuthenticator {
    fn cookie_name(&self) -> &str {
        "blogo_session"
    }

    fn validate_token(&self, _token: &str) -> Result<SessionClaims, TokenError> {
        self.outcome.clone()
    }
}
