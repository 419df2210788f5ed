use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::errors::TaskError;
use crate::TaskResult;

/// Marks that URI-component encoding leaves as-is but `urlencoding` escapes.
const URI_COMPONENT_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Storage address of a user's document: the username escaped as a URI
/// component, base64-encoded. Reversible, not secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    pub fn from_username(username: &str) -> Self {
        let escaped = URI_COMPONENT_MARKS
            .iter()
            .fold(urlencoding::encode(username).into_owned(), |escaped, (code, mark)| {
                escaped.replace(code, mark)
            });
        Self(STANDARD.encode(escaped.as_bytes()))
    }

    /// Wraps a key read from storage without checking it.
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn username(&self) -> TaskResult<String> {
        let bytes = STANDARD.decode(&self.0)?;
        let escaped = String::from_utf8(bytes)?;
        urlencoding::decode(&escaped)
            .map(|name| name.into_owned())
            .map_err(|e| TaskError::MalformedUserKey(e.to_string()))
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_username(username: &str) -> TaskResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(TaskError::EmptyUsername);
    }
    Ok(username.to_string())
}

/// An optional PIN: blank means "no PIN", otherwise exactly four digits.
pub fn validate_pin(pin: Option<&str>) -> TaskResult<Option<String>> {
    match pin.map(str::trim).filter(|pin| !pin.is_empty()) {
        None => Ok(None),
        Some(pin) if pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(Some(pin.to_string()))
        }
        Some(_) => Err(TaskError::InvalidPin),
    }
}
