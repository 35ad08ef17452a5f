//! The resolved build configuration handed to the packaging step.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ApplicationId, PackagingRules, SigningCredentials};

/// Which kind of artifact the orchestrating build is producing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    #[display("debug")]
    Debug,
    #[display("release")]
    Release,
}

impl BuildMode {
    pub fn is_release(&self) -> bool {
        matches!(self, BuildMode::Release)
    }
}

/// Platform API levels. Valid only when `min <= target <= compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformVersions {
    /// Lowest platform version the artifact installs on.
    pub min: u32,
    /// Platform version the artifact is tested against.
    pub target: u32,
    /// Platform version the sources are compiled against.
    pub compile: u32,
}

impl PlatformVersions {
    pub fn new(min: u32, target: u32, compile: u32) -> Self {
        Self {
            min,
            target,
            compile,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.target && self.target <= self.compile
    }
}

/// A fully resolved and validated build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    /// Unique application identifier.
    pub application_id: ApplicationId,
    /// Code namespace (usually the application id).
    pub namespace: String,
    /// Platform API levels.
    pub platform: PlatformVersions,
    /// Monotonic version number supplied by the toolchain.
    pub version_code: u32,
    /// Human readable version supplied by the toolchain.
    pub version_name: String,
    /// Native toolchain version, if pinned.
    pub ndk_version: Option<String>,
    /// JVM bytecode target.
    pub jvm_target: u32,
    /// Root of the framework project the build belongs to.
    pub source_root: PathBuf,
    /// Signing credentials, present only when a properties source supplied them.
    pub signing: Option<SigningCredentials>,
    /// Packaging rules for the final artifact.
    pub packaging: PackagingRules,
}

impl BuildConfiguration {
    /// Signing credentials for a release artifact, or an error if none were resolved.
    pub fn release_signing(&self) -> crate::Result<&SigningCredentials> {
        self.signing.as_ref().ok_or(crate::Error::SigningNotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_ordering() {
        assert!(PlatformVersions::new(26, 35, 35).is_ordered());
        assert!(PlatformVersions::new(21, 21, 21).is_ordered());
        assert!(!PlatformVersions::new(36, 35, 35).is_ordered());
        assert!(!PlatformVersions::new(26, 35, 34).is_ordered());
    }

    #[test]
    fn test_build_mode_display() {
        assert_eq!(BuildMode::Debug.to_string(), "debug");
        assert_eq!(BuildMode::Release.to_string(), "release");
        assert!(BuildMode::Release.is_release());
        assert_eq!(BuildMode::default(), BuildMode::Debug);
    }
}
