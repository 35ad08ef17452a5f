//! CLI command implementations.

use anyhow::{Context, Result};
use shipconf_config::{CallerParams, Defaults, load_defaults_or_builtin};
use shipconf_core::{BuildConfiguration, BuildMode};
use std::fmt::Write;
use std::path::Path;
use tracing::debug;

use crate::ResolveArgs;

pub fn resolve(defaults_path: &Path, args: &ResolveArgs, json: bool) -> Result<()> {
    let config = resolve_config(defaults_path, args)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", render_text(&config)?);
    }
    Ok(())
}

pub fn validate(defaults_path: &Path, args: &ResolveArgs) -> Result<()> {
    match resolve_config(defaults_path, args) {
        Ok(config) => {
            println!(
                "Configuration for {} is valid ({})",
                config.application_id,
                caller_params(args).mode
            );
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

pub fn check_excludes(defaults_path: &Path, paths: &[String]) -> Result<()> {
    let defaults = read_defaults(defaults_path)?;
    let matcher = defaults.packaging.matcher()?;
    debug!(
        patterns = defaults.packaging.excludes.len(),
        "Checking paths against exclusion rules"
    );

    for path in paths {
        let verdict = if matcher.is_excluded(path) {
            "excluded"
        } else {
            "kept"
        };
        println!("{:<9} {}", verdict, path);
    }
    Ok(())
}

fn read_defaults(path: &Path) -> Result<Defaults> {
    load_defaults_or_builtin(path)
        .with_context(|| format!("Failed to load defaults file: {}", path.display()))
}

fn resolve_config(defaults_path: &Path, args: &ResolveArgs) -> Result<BuildConfiguration> {
    let defaults = read_defaults(defaults_path)?;
    shipconf_config::resolve(&args.properties, &defaults, &caller_params(args)).with_context(
        || {
            format!(
                "Failed to resolve build configuration from {}",
                args.properties.display()
            )
        },
    )
}

fn caller_params(args: &ResolveArgs) -> CallerParams {
    CallerParams {
        mode: if args.release {
            BuildMode::Release
        } else {
            BuildMode::Debug
        },
        min_platform: args.min_platform,
        target_platform: args.target_platform,
        compile_platform: args.compile_platform,
        version_code: args.version_code,
        version_name: args.version_name.clone(),
    }
}

fn render_text(config: &BuildConfiguration) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "application:  {}", config.application_id)?;
    writeln!(out, "namespace:    {}", config.namespace)?;
    writeln!(
        out,
        "platform:     min {} / target {} / compile {}",
        config.platform.min, config.platform.target, config.platform.compile
    )?;
    writeln!(out, "version:      {} ({})", config.version_name, config.version_code)?;
    if let Some(ndk) = &config.ndk_version {
        writeln!(out, "ndk:          {}", ndk)?;
    }
    writeln!(out, "jvm target:   {}", config.jvm_target)?;
    writeln!(out, "source root:  {}", config.source_root.display())?;

    match &config.signing {
        Some(signing) => {
            let store = signing
                .key_store_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(out, "signing:      alias {} (keystore {})", signing.alias, store)?;
        }
        None => {
            writeln!(out, "signing:      none")?;
        }
    }

    writeln!(out, "legacy jni:   {}", config.packaging.legacy_jni_packaging)?;
    writeln!(out, "excludes:")?;
    for pattern in &config.packaging.excludes {
        writeln!(out, "  - {}", pattern)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipconf_core::{ApplicationId, PackagingRules, PlatformVersions, SigningCredentials};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(properties: PathBuf, release: bool) -> ResolveArgs {
        ResolveArgs {
            properties,
            release,
            min_platform: None,
            target_platform: None,
            compile_platform: None,
            version_code: Some(3),
            version_name: None,
        }
    }

    #[test]
    fn test_caller_params_from_args() {
        let params = caller_params(&args(PathBuf::from("key.properties"), true));
        assert_eq!(params.mode, BuildMode::Release);
        assert_eq!(params.version_code, Some(3));
        assert_eq!(params.min_platform, None);
    }

    #[test]
    fn test_render_text_hides_passwords() {
        let config = BuildConfiguration {
            application_id: ApplicationId::new("com.example.app").unwrap(),
            namespace: "com.example.app".to_string(),
            platform: PlatformVersions::new(26, 35, 35),
            version_code: 1,
            version_name: "1.0.0".to_string(),
            ndk_version: None,
            jvm_target: 17,
            source_root: PathBuf::from("../.."),
            signing: Some(SigningCredentials::new("upload", "kp-secret", None, "sp-secret")),
            packaging: PackagingRules::with_default_exclusions(),
        };

        let text = render_text(&config).unwrap();
        assert!(text.contains("application:  com.example.app"));
        assert!(text.contains("alias upload (keystore -)"));
        assert!(text.contains("  - META-INF/*.md"));
        assert!(!text.contains("kp-secret"));
        assert!(!text.contains("sp-secret"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("kp-secret"));
    }

    #[test]
    fn test_resolve_config_end_to_end() {
        let dir = TempDir::new().unwrap();
        let defaults_path = dir.path().join("shipconf.kdl");
        std::fs::write(&defaults_path, "application \"com.swm.tk_hero_chess\"\n").unwrap();
        let properties = dir.path().join("key.properties");
        std::fs::write(&properties, "keyAlias=upload\nkeyPassword=kp\nstorePassword=sp\n")
            .unwrap();

        let config = resolve_config(&defaults_path, &args(properties, true)).unwrap();
        assert_eq!(config.version_code, 3);
        assert_eq!(config.signing.unwrap().alias, "upload");
    }

    #[test]
    fn test_missing_defaults_file_uses_builtin_table() {
        let dir = TempDir::new().unwrap();
        let config = resolve_config(
            &dir.path().join("shipconf.kdl"),
            &args(dir.path().join("key.properties"), false),
        )
        .unwrap();
        assert_eq!(config.application_id.as_str(), "com.swm.tk_hero_chess");
        assert_eq!(config.version_code, 3);
        assert!(config.signing.is_none());
    }

    #[test]
    fn test_unreadable_defaults_file_has_context() {
        let dir = TempDir::new().unwrap();
        let defaults_path = dir.path().join("shipconf.kdl");
        std::fs::write(&defaults_path, "platform min=26\n").unwrap();
        let err = resolve_config(&defaults_path, &args(dir.path().join("key.properties"), false))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load defaults file"));
    }
}
