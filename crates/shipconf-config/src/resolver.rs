//! Build configuration resolution.
//!
//! Precedence, lowest first: [`Defaults`], the properties file, [`CallerParams`].

use shipconf_core::{BuildConfiguration, BuildMode, PlatformVersions, SigningCredentials};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::defaults::Defaults;
use crate::properties::{Properties, keys, load_properties};
use crate::{ConfigError, ConfigResult};

/// Parameters supplied by the orchestrating toolchain. Always win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerParams {
    pub mode: BuildMode,
    pub min_platform: Option<u32>,
    pub target_platform: Option<u32>,
    pub compile_platform: Option<u32>,
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
}

impl CallerParams {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn release() -> Self {
        Self::new(BuildMode::Release)
    }

    pub fn with_platform(mut self, min: u32, target: u32, compile: u32) -> Self {
        self.min_platform = Some(min);
        self.target_platform = Some(target);
        self.compile_platform = Some(compile);
        self
    }

    pub fn with_version(mut self, code: u32, name: impl Into<String>) -> Self {
        self.version_code = Some(code);
        self.version_name = Some(name.into());
        self
    }
}

/// Resolve a build configuration from an optional properties file.
///
/// A missing file is treated as empty. Relative `storeFile` values are
/// resolved against the properties file's directory.
pub fn resolve(
    properties_path: &Path,
    defaults: &Defaults,
    params: &CallerParams,
) -> ConfigResult<BuildConfiguration> {
    let properties = load_properties(properties_path)?;
    let base_dir = match properties_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    resolve_properties(properties.as_ref(), base_dir, defaults, params)
}

/// Resolve from already-loaded properties.
///
/// `properties` is `None` when no properties source exists, in which case no
/// signing credentials are produced.
pub fn resolve_properties(
    properties: Option<&Properties>,
    base_dir: &Path,
    defaults: &Defaults,
    params: &CallerParams,
) -> ConfigResult<BuildConfiguration> {
    let lookup = |key: &str| properties.and_then(|p| p.get(key));

    if let Some(props) = properties {
        for key in props.keys().filter(|k| !keys::ALL.contains(k)) {
            debug!(key, "Ignoring unrecognised properties key");
        }
    }

    let version_code = match params.version_code {
        Some(code) => code,
        None => match lookup(keys::VERSION_CODE) {
            Some(raw) => parse_u32(keys::VERSION_CODE, raw)?,
            None => defaults.version_code,
        },
    };
    let version_name = params
        .version_name
        .clone()
        .or_else(|| lookup(keys::VERSION_NAME).map(str::to_string))
        .unwrap_or_else(|| defaults.version_name.clone());

    let signing = resolve_signing(properties, base_dir, defaults, params.mode)?;

    let platform = PlatformVersions::new(
        params.min_platform.unwrap_or(defaults.platform.min),
        params.target_platform.unwrap_or(defaults.platform.target),
        params.compile_platform.unwrap_or(defaults.platform.compile),
    );
    if !platform.is_ordered() {
        return Err(ConfigError::InvalidVersionOrdering {
            min: platform.min,
            target: platform.target,
            compile: platform.compile,
        });
    }

    let config = BuildConfiguration {
        application_id: defaults.application_id.clone(),
        namespace: defaults
            .namespace
            .clone()
            .unwrap_or_else(|| defaults.application_id.to_string()),
        platform,
        version_code,
        version_name,
        ndk_version: defaults.ndk_version.clone(),
        jvm_target: defaults.jvm_target,
        source_root: defaults.source_root.clone(),
        signing,
        packaging: defaults.packaging.clone(),
    };

    info!(
        application_id = %config.application_id,
        mode = %params.mode,
        min = platform.min,
        target = platform.target,
        compile = platform.compile,
        version_code = config.version_code,
        signed = config.signing.is_some(),
        "Resolved build configuration"
    );

    Ok(config)
}

fn resolve_signing(
    properties: Option<&Properties>,
    base_dir: &Path,
    defaults: &Defaults,
    mode: BuildMode,
) -> ConfigResult<Option<SigningCredentials>> {
    let lookup = |key: &str| {
        properties
            .and_then(|p| p.get(key))
            .filter(|v| !v.trim().is_empty())
    };

    let alias = lookup(keys::KEY_ALIAS)
        .map(str::to_string)
        .or_else(|| defaults.key_alias.clone());
    let key_password = lookup(keys::KEY_PASSWORD);
    let store_password = lookup(keys::STORE_PASSWORD);

    if mode.is_release() {
        let required = [
            (keys::KEY_ALIAS, alias.is_some()),
            (keys::KEY_PASSWORD, key_password.is_some()),
            (keys::STORE_PASSWORD, store_password.is_some()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, present)| !present) {
            return Err(ConfigError::MissingSigningField(field.to_string()));
        }
    }

    let store_file = match lookup(keys::STORE_FILE) {
        Some(raw) => Some(resolve_path(base_dir, Path::new(raw))),
        None => defaults.store_file.clone(),
    };
    if let Some(path) = &store_file {
        if !path.exists() {
            return Err(ConfigError::KeyStoreNotFound(path.clone()));
        }
    }

    if properties.is_none() {
        return Ok(None);
    }
    if !mode.is_release() {
        debug!(%mode, "Signing credentials are only resolved for release builds");
        return Ok(None);
    }

    let (Some(alias), Some(key_password), Some(store_password)) =
        (alias, key_password, store_password)
    else {
        return Ok(None);
    };
    Ok(Some(SigningCredentials::new(
        alias,
        key_password,
        store_file,
        store_password,
    )))
}

fn parse_u32(field: &str, raw: &str) -> ConfigResult<u32> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("expected a non-negative integer, got '{}'", raw),
    })
}

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
