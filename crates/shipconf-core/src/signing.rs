//! Release signing credentials.

use serde::Serialize;
use std::path::PathBuf;

use crate::Secret;

/// Credentials used by the packaging step to sign a release artifact.
///
/// Owned by a [`crate::BuildConfiguration`]; there is no way to build one
/// without all three secret-bearing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningCredentials {
    /// Key alias inside the keystore.
    pub alias: String,
    /// Password of the key entry.
    pub password: Secret,
    /// Keystore file, already resolved to an existing path.
    pub key_store_path: Option<PathBuf>,
    /// Password of the keystore itself.
    pub store_password: Secret,
}

impl SigningCredentials {
    pub fn new(
        alias: impl Into<String>,
        password: impl Into<Secret>,
        key_store_path: Option<PathBuf>,
        store_password: impl Into<Secret>,
    ) -> Self {
        Self {
            alias: alias.into(),
            password: password.into(),
            key_store_path,
            store_password: store_password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_shows_passwords() {
        let creds = SigningCredentials::new(
            "upload",
            "key-pass",
            Some(PathBuf::from("/keys/upload.jks")),
            "store-pass",
        );
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("upload"));
        assert!(!rendered.contains("key-pass"));
        assert!(!rendered.contains("store-pass"));

        let json = serde_json::to_string(&creds).unwrap();
        assert!(!json.contains("key-pass"));
        assert!(!json.contains("store-pass"));
    }
}
