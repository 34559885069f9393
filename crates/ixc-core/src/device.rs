//! Device identity and credential types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a serial number does not match the vendor format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid serial number {0:?}: expected three hyphen-separated groups of three alphanumeric characters")]
pub struct InvalidSerial(pub String);

/// Serial number of one charger, e.g. `ABC-DEF-123`.
///
/// The vendor format is three hyphen-separated segments of exactly three
/// ASCII alphanumeric characters each. Parsing enforces the format so a
/// malformed serial is rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialNumber(String);

impl SerialNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SerialNumber {
    type Err = InvalidSerial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let valid = parts.len() == 3
            && parts
                .iter()
                .all(|p| p.len() == 3 && p.chars().all(|c| c.is_ascii_alphanumeric()));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidSerial(s.to_string()))
        }
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// API key credential for the vendor endpoint.
///
/// Immutable for the lifetime of a client; rotating the credential means
/// constructing a new client. The Debug impl redacts the secret so it never
/// leaks into logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw secret, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}
