//! Built-in defaults and the optional KDL defaults file.
//!
//! A defaults file (`shipconf.kdl`) overrides the built-in table:
//!
//! ```kdl
//! application "com.example.app" namespace="com.example.app"
//! platform min=26 target=35 compile=35
//! version code=1 name="1.0.0"
//! ndk "27.2.12479018"
//! jvm-target 17
//! source-root "../.."
//! packaging legacy-jni=#true inherit-defaults=#true {
//!     exclude "META-INF/*.kotlin_module"
//! }
//! signing {
//!     key-alias "upload"
//!     store-file "upload-keystore.jks"
//! }
//! ```
//!
//! Passwords are never accepted here; they only come from the properties file.

use kdl::{KdlDocument, KdlNode, KdlValue};
use shipconf_core::{ApplicationId, ExclusionPattern, PackagingRules, PlatformVersions};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::resolver::resolve_path;
use crate::{ConfigError, ConfigResult};

pub const DEFAULT_MIN_PLATFORM: u32 = 26;
pub const DEFAULT_TARGET_PLATFORM: u32 = 35;
pub const DEFAULT_COMPILE_PLATFORM: u32 = 35;
pub const DEFAULT_VERSION_CODE: u32 = 1;
pub const DEFAULT_VERSION_NAME: &str = "1.0.0";
pub const DEFAULT_NDK_VERSION: &str = "27.2.12479018";
pub const DEFAULT_JVM_TARGET: u32 = 17;
pub const DEFAULT_SOURCE_ROOT: &str = "../..";
/// Application id of the built-in table, used when no defaults file exists.
pub const BUILTIN_APPLICATION_ID: &str = "com.swm.tk_hero_chess";

/// Fallback values used when neither the properties file nor the caller
/// supplies a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub application_id: ApplicationId,
    /// Falls back to the application id when unset.
    pub namespace: Option<String>,
    pub platform: PlatformVersions,
    pub version_code: u32,
    pub version_name: String,
    pub ndk_version: Option<String>,
    pub jvm_target: u32,
    pub source_root: PathBuf,
    pub packaging: PackagingRules,
    /// Non-secret signing defaults.
    pub key_alias: Option<String>,
    pub store_file: Option<PathBuf>,
}

impl Defaults {
    /// Built-in defaults for an application.
    pub fn new(application_id: ApplicationId) -> Self {
        Self {
            application_id,
            namespace: None,
            platform: PlatformVersions::new(
                DEFAULT_MIN_PLATFORM,
                DEFAULT_TARGET_PLATFORM,
                DEFAULT_COMPILE_PLATFORM,
            ),
            version_code: DEFAULT_VERSION_CODE,
            version_name: DEFAULT_VERSION_NAME.to_string(),
            ndk_version: Some(DEFAULT_NDK_VERSION.to_string()),
            jvm_target: DEFAULT_JVM_TARGET,
            source_root: PathBuf::from(DEFAULT_SOURCE_ROOT),
            packaging: PackagingRules::with_default_exclusions(),
            key_alias: None,
            store_file: None,
        }
    }

    /// The built-in table, with no defaults file involved.
    pub fn builtin() -> ConfigResult<Self> {
        Ok(Self::new(ApplicationId::new(BUILTIN_APPLICATION_ID)?))
    }
}

/// Load a defaults file from disk.
///
/// A relative `store-file` is taken relative to the defaults file.
pub fn load_defaults(path: &Path) -> ConfigResult<Defaults> {
    let content = std::fs::read_to_string(path)?;
    let mut defaults = parse_defaults(&content)?;
    if let Some(dir) = path.parent() {
        defaults.store_file = defaults.store_file.take().map(|f| resolve_path(dir, &f));
    }
    info!(
        path = %path.display(),
        application_id = %defaults.application_id,
        "Loaded defaults file"
    );
    Ok(defaults)
}

/// Load a defaults file, falling back to [`Defaults::builtin`] when it does
/// not exist. Any other read or parse failure is still an error.
pub fn load_defaults_or_builtin(path: &Path) -> ConfigResult<Defaults> {
    match load_defaults(path) {
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No defaults file, using built-in defaults");
            Defaults::builtin()
        }
        other => other,
    }
}

/// Parse a defaults file from KDL text.
pub fn parse_defaults(kdl: &str) -> ConfigResult<Defaults> {
    let doc: KdlDocument = kdl.parse()?;

    let app_node = doc
        .nodes()
        .iter()
        .find(|n| n.name().value() == "application")
        .ok_or_else(|| ConfigError::MissingField("application".to_string()))?;
    let id = get_first_string_arg(app_node)
        .ok_or_else(|| ConfigError::MissingField("application id".to_string()))?;

    let mut defaults = Defaults::new(ApplicationId::new(id)?);
    defaults.namespace = get_string_prop(app_node, "namespace");

    for node in doc.nodes() {
        match node.name().value() {
            "platform" => {
                if let Some(min) = get_u32_prop(node, "min")? {
                    defaults.platform.min = min;
                }
                if let Some(target) = get_u32_prop(node, "target")? {
                    defaults.platform.target = target;
                }
                if let Some(compile) = get_u32_prop(node, "compile")? {
                    defaults.platform.compile = compile;
                }
            }
            "version" => {
                if let Some(code) = get_u32_prop(node, "code")? {
                    defaults.version_code = code;
                }
                if let Some(name) = get_string_prop(node, "name") {
                    defaults.version_name = name;
                }
            }
            "ndk" => {
                defaults.ndk_version = get_first_string_arg(node);
            }
            "jvm-target" => {
                defaults.jvm_target = get_first_u32_arg(node)?
                    .ok_or_else(|| ConfigError::MissingField("jvm-target value".to_string()))?;
            }
            "source-root" => {
                let root = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("source-root path".to_string()))?;
                defaults.source_root = PathBuf::from(root);
            }
            "packaging" => parse_packaging(node, &mut defaults.packaging)?,
            "signing" => parse_signing(node, &mut defaults)?,
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(defaults)
}

fn parse_packaging(node: &KdlNode, packaging: &mut PackagingRules) -> ConfigResult<()> {
    if let Some(legacy) = get_bool_prop(node, "legacy-jni")? {
        packaging.legacy_jni_packaging = legacy;
    }
    if get_bool_prop(node, "inherit-defaults")? == Some(false) {
        packaging.excludes.clear();
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "exclude" {
                for pattern in get_all_string_args(child) {
                    packaging.exclude(ExclusionPattern::new(pattern)?);
                }
            }
        }
    }

    Ok(())
}

fn parse_signing(node: &KdlNode, defaults: &mut Defaults) -> ConfigResult<()> {
    let Some(children) = node.children() else {
        return Ok(());
    };

    for child in children.nodes() {
        match child.name().value() {
            "key-alias" => defaults.key_alias = get_first_string_arg(child),
            "store-file" => defaults.store_file = get_first_string_arg(child).map(PathBuf::from),
            name @ ("key-password" | "store-password") => {
                return Err(ConfigError::InvalidValue {
                    field: format!("signing.{}", name),
                    message: "passwords must be supplied through the properties file".to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

// Helper functions for extracting values from KDL nodes

fn get_first_arg(node: &KdlNode) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(|e| e.value())
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    get_first_arg(node)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn get_first_u32_arg(node: &KdlNode) -> ConfigResult<Option<u32>> {
    get_first_arg(node)
        .map(|v| value_to_u32(node.name().value(), v))
        .transpose()
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn get_bool_prop(node: &KdlNode, name: &str) -> ConfigResult<Option<bool>> {
    match node.get(name) {
        None => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| ConfigError::InvalidValue {
            field: format!("{}.{}", node.name().value(), name),
            message: format!("expected a boolean, got {}", v),
        }),
    }
}

fn get_u32_prop(node: &KdlNode, name: &str) -> ConfigResult<Option<u32>> {
    node.get(name)
        .map(|v| value_to_u32(&format!("{}.{}", node.name().value(), name), v))
        .transpose()
}

fn value_to_u32(field: &str, value: &KdlValue) -> ConfigResult<u32> {
    value
        .as_integer()
        .and_then(|i| u32::try_from(i).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a non-negative integer, got {}", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let defaults = Defaults::new(ApplicationId::new("com.example.app").unwrap());
        assert_eq!(defaults.platform, PlatformVersions::new(26, 35, 35));
        assert_eq!(defaults.ndk_version.as_deref(), Some("27.2.12479018"));
        assert_eq!(defaults.jvm_target, 17);
        assert!(defaults.packaging.legacy_jni_packaging);
        assert!(defaults.packaging.is_excluded("META-INF/DEPENDENCIES"));
        assert_eq!(defaults.source_root, PathBuf::from("../.."));
    }

    #[test]
    fn test_builtin_uses_shipped_application_id() {
        let defaults = Defaults::builtin().unwrap();
        assert_eq!(defaults.application_id.as_str(), "com.swm.tk_hero_chess");
        assert_eq!(defaults.namespace, None);
        assert_eq!(defaults.key_alias, None);
    }

    #[test]
    fn test_missing_defaults_file_falls_back_to_builtin() {
        let dir = tempfile::TempDir::new().unwrap();
        let defaults = load_defaults_or_builtin(&dir.path().join("shipconf.kdl")).unwrap();
        assert_eq!(defaults, Defaults::builtin().unwrap());
    }

    #[test]
    fn test_broken_defaults_file_is_not_replaced_by_builtin() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shipconf.kdl");
        std::fs::write(&path, "platform min=26\n").unwrap();
        let err = load_defaults_or_builtin(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "application"));
    }

    #[test]
    fn test_parse_minimal_defaults() {
        let defaults = parse_defaults(r#"application "com.swm.tk_hero_chess""#).unwrap();
        assert_eq!(defaults.application_id.as_str(), "com.swm.tk_hero_chess");
        assert_eq!(defaults.namespace, None);
        assert_eq!(defaults.version_code, DEFAULT_VERSION_CODE);
    }

    #[test]
    fn test_parse_full_defaults() {
        let kdl = r#"
            application "com.example.app" namespace="com.example"
            platform min=24 target=34 compile=35
            version code=42 name="2.1.0"
            ndk "26.1.10909125"
            jvm-target 11
            source-root "../app"
            packaging legacy-jni=#false {
                exclude "META-INF/*.kotlin_module" "META-INF/LICENSE"
            }
            signing {
                key-alias "upload"
                store-file "upload-keystore.jks"
            }
        "#;

        let defaults = parse_defaults(kdl).unwrap();
        assert_eq!(defaults.namespace.as_deref(), Some("com.example"));
        assert_eq!(defaults.platform, PlatformVersions::new(24, 34, 35));
        assert_eq!(defaults.version_code, 42);
        assert_eq!(defaults.version_name, "2.1.0");
        assert_eq!(defaults.ndk_version.as_deref(), Some("26.1.10909125"));
        assert_eq!(defaults.jvm_target, 11);
        assert_eq!(defaults.source_root, PathBuf::from("../app"));
        assert!(!defaults.packaging.legacy_jni_packaging);
        assert!(defaults.packaging.is_excluded("META-INF/foo.kotlin_module"));
        // Built-in exclusions are kept, and the duplicate collapsed.
        assert!(defaults.packaging.is_excluded("META-INF/NOTICE"));
        assert_eq!(
            defaults.packaging.excludes.len(),
            shipconf_core::packaging::DEFAULT_EXCLUSIONS.len() + 1
        );
        assert_eq!(defaults.key_alias.as_deref(), Some("upload"));
        assert_eq!(defaults.store_file, Some(PathBuf::from("upload-keystore.jks")));
    }

    #[test]
    fn test_packaging_without_inherited_exclusions() {
        let kdl = r#"
            application "com.example.app"
            packaging inherit-defaults=#false {
                exclude "META-INF/**"
            }
        "#;
        let defaults = parse_defaults(kdl).unwrap();
        assert_eq!(defaults.packaging.excludes.len(), 1);
    }

    #[test]
    fn test_missing_application() {
        let result = parse_defaults("platform min=21");
        assert!(matches!(result.unwrap_err(), ConfigError::MissingField(_)));
    }

    #[test]
    fn test_invalid_application_id() {
        let result = parse_defaults(r#"application "not-an-id""#);
        assert!(matches!(result.unwrap_err(), ConfigError::Core(_)));
    }

    #[test]
    fn test_wrong_value_types() {
        let result = parse_defaults(
            r#"
            application "com.example.app"
            platform min="26"
        "#,
        );
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue { field, .. } if field == "platform.min"
        ));

        let result = parse_defaults(
            r#"
            application "com.example.app"
            version code=-1
        "#,
        );
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_passwords_rejected() {
        let kdl = r#"
            application "com.example.app"
            signing {
                store-password "hunter2"
            }
        "#;
        let err = parse_defaults(kdl).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "signing.store-password"
        ));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_load_defaults_resolves_store_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shipconf.kdl");
        std::fs::write(
            &path,
            "application \"com.example.app\"\nsigning {\n    store-file \"keys/upload.jks\"\n}\n",
        )
        .unwrap();

        let defaults = load_defaults(&path).unwrap();
        assert_eq!(defaults.store_file, Some(dir.path().join("keys/upload.jks")));
    }

    #[test]
    fn test_kdl_syntax_error() {
        let result = parse_defaults(r#"application "unterminated"#);
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }
}
