//! Configuration resolution errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("missing required signing field: {0}")]
    MissingSigningField(String),

    #[error("keystore not found: {}", .0.display())]
    KeyStoreNotFound(PathBuf),

    #[error(
        "invalid platform version ordering: min ({min}) <= target ({target}) <= compile ({compile}) does not hold"
    )]
    InvalidVersionOrdering { min: u32, target: u32, compile: u32 },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error(transparent)]
    Core(#[from] shipconf_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A properties line that was skipped. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct PropertiesWarning {
    /// 1-based line number where the logical line starts.
    pub line: usize,
    pub kind: PropertiesWarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertiesWarningKind {
    #[error("no '=' or ':' separator")]
    MissingSeparator,

    #[error("empty key")]
    EmptyKey,

    #[error("malformed escape sequence")]
    BadEscape,

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}
