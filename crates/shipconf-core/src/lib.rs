//! Core domain types for shipconf.
//!
//! This crate contains:
//! - Application identifiers and platform versions
//! - The resolved build configuration
//! - Signing credentials and secret handling
//! - Packaging exclusion rules and the packaging hand-off

pub mod application;
pub mod build;
pub mod error;
pub mod packaging;
pub mod secret;
pub mod signing;

pub use application::ApplicationId;
pub use build::{BuildConfiguration, BuildMode, PlatformVersions};
pub use error::{Error, Result};
pub use packaging::{ExclusionPattern, PackagingPlan, PackagingRules};
pub use secret::Secret;
pub use signing::SigningCredentials;
