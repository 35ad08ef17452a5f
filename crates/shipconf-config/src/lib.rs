//! Build configuration resolution for shipconf.
//!
//! This crate handles:
//! - Optional `key.properties` signing sources (lenient parsing)
//! - Built-in defaults and the KDL defaults file (shipconf.kdl)
//! - Merging, precedence and validation into a `BuildConfiguration`

pub mod defaults;
pub mod error;
pub mod properties;
pub mod resolver;

pub use defaults::{Defaults, load_defaults, load_defaults_or_builtin, parse_defaults};
pub use error::{ConfigError, ConfigResult, PropertiesWarning, PropertiesWarningKind};
pub use properties::{Properties, load_properties};
pub use resolver::{CallerParams, resolve, resolve_properties};
