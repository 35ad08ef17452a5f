//! Application identifiers.

use derive_more::Display;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::{Error, Result};

// Two or more dot-separated segments, each starting with a letter.
static APPLICATION_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(?:\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap()
});

/// The unique identifier of a packaged application (e.g. `com.example.app`).
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Validate and wrap an application identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if APPLICATION_ID_REGEX.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(Error::InvalidInput(format!(
                "application id '{}' must be at least two dot-separated segments, \
                 each starting with a letter and containing only [A-Za-z0-9_]",
                id
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = Error;

    fn try_from(id: String) -> Result<Self> {
        Self::new(id)
    }
}

impl From<ApplicationId> for String {
    fn from(id: ApplicationId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ApplicationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["com.swm.tk_hero_chess", "com.example.app", "a.b", "org.Foo9.bar_"] {
            let parsed = ApplicationId::new(id).unwrap();
            assert_eq!(parsed.as_str(), id);
            assert_eq!(parsed.to_string(), id);
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in ["", "app", "com..app", "com.1app", ".com.app", "com.app.", "com.my-app"] {
            assert!(
                matches!(ApplicationId::new(id), Err(Error::InvalidInput(_))),
                "{id} should be rejected"
            );
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ApplicationId = serde_json::from_str("\"com.example.app\"").unwrap();
        assert_eq!(ok.as_str(), "com.example.app");
        assert!(serde_json::from_str::<ApplicationId>("\"nodots\"").is_err());
    }
}
