//! Lenient `key=value` properties files.
//!
//! Supported syntax:
//! - `key=value` and `key: value`, split on the first unescaped `=` or `:`
//! - whitespace around the key and before the value is ignored
//! - `#` and `!` start a comment line, blank lines are skipped
//! - a trailing `\` continues the entry on the next line
//! - escapes `\t \n \r \f \uXXXX`; any other escaped char stands for itself
//!
//! A line that cannot be parsed is skipped and recorded as a
//! [`PropertiesWarning`]; the rest of the file still loads.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ConfigResult, PropertiesWarning, PropertiesWarningKind};

/// Keys understood by the resolver.
pub mod keys {
    pub const KEY_ALIAS: &str = "keyAlias";
    pub const KEY_PASSWORD: &str = "keyPassword";
    pub const STORE_FILE: &str = "storeFile";
    pub const STORE_PASSWORD: &str = "storePassword";
    pub const VERSION_CODE: &str = "versionCode";
    pub const VERSION_NAME: &str = "versionName";

    pub const ALL: &[&str] = &[
        KEY_ALIAS,
        KEY_PASSWORD,
        STORE_FILE,
        STORE_PASSWORD,
        VERSION_CODE,
        VERSION_NAME,
    ];
}

/// Parsed contents of a properties source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
    warnings: Vec<PropertiesWarning>,
    /// File the entries were read from, if any.
    source: Option<PathBuf>,
}

impl Properties {
    /// Parse properties from in-memory text.
    pub fn parse(text: &str) -> Self {
        // Reading from a byte slice cannot fail.
        Self::from_reader(text.as_bytes()).unwrap_or_default()
    }

    /// Parse properties from any buffered reader.
    ///
    /// Only I/O failures are errors; malformed lines become warnings.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut props = Self::default();
        // (line number where the logical line starts, text so far)
        let mut pending: Option<(usize, String)> = None;
        // Set while swallowing the continuation lines of a discarded entry.
        let mut discarding = false;

        for (idx, raw) in reader.split(b'\n').enumerate() {
            let line_no = idx + 1;
            let mut raw = raw?;
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            if discarding {
                discarding = ends_with_continuation(&raw);
                continue;
            }

            let text = match String::from_utf8(raw) {
                Ok(text) => text,
                Err(e) => {
                    let start = pending.take().map(|(start, _)| start).unwrap_or(line_no);
                    props.warn(start, PropertiesWarningKind::InvalidUtf8);
                    discarding = ends_with_continuation(e.as_bytes());
                    continue;
                }
            };

            let (start, mut logical) = match pending.take() {
                Some((start, mut acc)) => {
                    acc.push_str(text.trim_start());
                    (start, acc)
                }
                None => {
                    let trimmed = text.trim_start();
                    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                        continue;
                    }
                    (line_no, trimmed.to_string())
                }
            };

            if ends_with_continuation(logical.as_bytes()) {
                logical.pop();
                pending = Some((start, logical));
                continue;
            }

            props.accept(start, &logical);
        }

        // A continuation on the last line just ends the entry.
        if let Some((start, logical)) = pending {
            props.accept(start, &logical);
        }

        Ok(props)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lines that were skipped while parsing.
    pub fn warnings(&self) -> &[PropertiesWarning] {
        &self.warnings
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn accept(&mut self, line: usize, logical: &str) {
        match parse_entry(logical) {
            Ok((key, value)) => {
                if self.entries.insert(key.clone(), value).is_some() {
                    debug!(line, key = %key, "Duplicate properties key, later value wins");
                }
            }
            Err(kind) => self.warn(line, kind),
        }
    }

    fn warn(&mut self, line: usize, kind: PropertiesWarningKind) {
        self.warnings.push(PropertiesWarning { line, kind });
    }
}

/// Load a properties file if it exists.
///
/// A missing file is `Ok(None)`. The file handle is dropped before returning
/// on every path.
pub fn load_properties(path: &Path) -> ConfigResult<Option<Properties>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No properties file, continuing with defaults");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let mut props = Properties::from_reader(BufReader::new(file))?;
    props.source = Some(path.to_path_buf());

    for warning in props.warnings() {
        warn!(
            path = %path.display(),
            line = warning.line,
            reason = %warning.kind,
            "Skipping malformed properties line"
        );
    }
    if props.is_empty() {
        warn!(path = %path.display(), "Properties file has no entries");
    } else {
        debug!(path = %path.display(), entries = props.len(), "Loaded properties file");
    }

    Ok(Some(props))
}

fn ends_with_continuation(line: &[u8]) -> bool {
    let trailing = line.iter().rev().take_while(|b| **b == b'\\').count();
    trailing % 2 == 1
}

fn parse_entry(line: &str) -> Result<(String, String), PropertiesWarningKind> {
    let sep = find_separator(line).ok_or(PropertiesWarningKind::MissingSeparator)?;
    let key = unescape(line[..sep].trim_end())?;
    if key.is_empty() {
        return Err(PropertiesWarningKind::EmptyKey);
    }
    let value = unescape(line[sep + 1..].trim_start())?;
    Ok((key, value))
}

fn find_separator(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some(i),
            _ => {}
        }
    }
    None
}

fn unescape(s: &str) -> Result<String, PropertiesWarningKind> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(PropertiesWarningKind::BadEscape);
                }
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(PropertiesWarningKind::BadEscape)?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}
