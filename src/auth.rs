use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::models::SESSION_MAX_AGE_SECONDS;

const SESSION_DIGEST_CONTEXT: &[u8] = b"bizdoc-session:v1:";

/// Checks a login attempt against the configured shared token.
pub fn verify_token(expected: Option<&str>, provided: &str) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Err(ApiError::Config(
            "ADMIN_ACCESS_TOKEN is not defined in environment variables".to_string(),
        ));
    };

    if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("Invalid access token".to_string()))
    }
}

/// Cookie value proving a successful login without exposing the token.
pub fn session_value(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SESSION_DIGEST_CONTEXT);
    hasher.update(token.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

pub fn session_cookie(name: &str, token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{name}={}; HttpOnly; Path=/; Max-Age={SESSION_MAX_AGE_SECONDS}; SameSite=Lax",
        session_value(token)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{name}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Finds `name` in a `Cookie` request header.
pub fn read_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key.trim() != name {
            return None;
        }
        let decoded = urlencoding::decode(value.trim())
            .map(std::borrow::Cow::into_owned)
            .unwrap_or_else(|_| value.trim().to_string());
        Some(decoded)
    })
}

/// A missing token means nobody can hold a valid session.
pub fn has_session(cookie_header: Option<&str>, name: &str, token: Option<&str>) -> bool {
    let (Some(header), Some(token)) = (cookie_header, token) else {
        return false;
    };
    read_cookie(header, name).is_some_and(|value| {
        constant_time_eq(value.as_bytes(), session_value(token).as_bytes())
    })
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
