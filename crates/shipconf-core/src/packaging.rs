//! Packaging exclusion rules and the hand-off to the packaging step.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{BuildConfiguration, BuildMode, Error, Result, SigningCredentials};

/// Metadata files that several dependencies ship under the same archive path.
/// Packaging them twice makes the packager fail, so they are dropped.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "META-INF/DEPENDENCIES",
    "META-INF/LICENSE",
    "META-INF/LICENSE.txt",
    "META-INF/license.txt",
    "META-INF/NOTICE",
    "META-INF/NOTICE.txt",
    "META-INF/notice.txt",
    "META-INF/ASL2.0",
    "META-INF/*.md",
];

/// A path glob removed from the final artifact.
///
/// `*` matches within one path segment, `**` matches across segments and
/// `?` matches a single non-separator character. The glob is compiled once,
/// on construction; equality and ordering only look at the glob text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExclusionPattern {
    glob: String,
    regex: Regex,
}

impl ExclusionPattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let glob = pattern.into();
        if glob.trim().is_empty() {
            return Err(Error::InvalidInput(
                "exclusion pattern must not be empty".to_string(),
            ));
        }
        let regex = Regex::new(&glob_to_regex(&glob)).map_err(|e| {
            Error::InvalidInput(format!("bad exclusion pattern '{}': {}", glob, e))
        })?;
        Ok(Self { glob, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Check a single archive path against this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(&normalize(path))
    }
}

/// Translate a glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}

impl PartialEq for ExclusionPattern {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob
    }
}

impl Eq for ExclusionPattern {}

impl PartialOrd for ExclusionPattern {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExclusionPattern {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.glob.cmp(&other.glob)
    }
}

impl std::hash::Hash for ExclusionPattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.glob.hash(state);
    }
}

impl TryFrom<String> for ExclusionPattern {
    type Error = Error;

    fn try_from(pattern: String) -> Result<Self> {
        Self::new(pattern)
    }
}

impl From<ExclusionPattern> for String {
    fn from(pattern: ExclusionPattern) -> Self {
        pattern.glob
    }
}

impl std::fmt::Display for ExclusionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.glob)
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Packaging options for the final artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingRules {
    /// Paths dropped from the artifact. Duplicates collapse.
    pub excludes: BTreeSet<ExclusionPattern>,
    /// Store native libraries compressed, the way older packagers did.
    pub legacy_jni_packaging: bool,
}

impl PackagingRules {
    /// Rules with the built-in exclusion table.
    pub fn with_default_exclusions() -> Self {
        // Every entry of the table is a plain glob; the table is checked in tests.
        let excludes = DEFAULT_EXCLUSIONS
            .iter()
            .filter_map(|p| ExclusionPattern::new(*p).ok())
            .collect();
        Self {
            excludes,
            legacy_jni_packaging: true,
        }
    }

    /// Add a pattern. Returns false if it was already present.
    pub fn exclude(&mut self, pattern: ExclusionPattern) -> bool {
        self.excludes.insert(pattern)
    }

    /// Compile all patterns into one matcher.
    pub fn matcher(&self) -> Result<ExclusionMatcher> {
        let set = RegexSet::new(self.excludes.iter().map(|p| p.regex.as_str()))
            .map_err(|e| Error::InvalidInput(format!("bad exclusion pattern: {}", e)))?;
        Ok(ExclusionMatcher { set })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excludes.iter().any(|p| p.matches(path))
    }
}

/// Compiled form of [`PackagingRules::excludes`].
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    set: RegexSet,
}

impl ExclusionMatcher {
    pub fn is_excluded(&self, path: &str) -> bool {
        self.set.is_match(&normalize(path))
    }
}

/// What the packaging step will do with a set of artifact inputs.
#[derive(Debug, Clone)]
pub struct PackagingPlan {
    pub mode: BuildMode,
    /// Inputs that end up in the artifact.
    pub included: Vec<String>,
    /// Inputs dropped by an exclusion pattern.
    pub excluded: Vec<String>,
    /// Credentials used to sign the artifact. Always set for release plans.
    pub signing: Option<SigningCredentials>,
}

impl PackagingPlan {
    /// Partition `inputs` with the configuration's exclusion rules.
    ///
    /// Fails before looking at any input when a release artifact is
    /// requested without signing credentials.
    pub fn new<I, S>(config: &BuildConfiguration, mode: BuildMode, inputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let signing = match mode {
            BuildMode::Release => Some(config.release_signing()?.clone()),
            BuildMode::Debug => config.signing.clone(),
        };

        let matcher = config.packaging.matcher()?;
        let (excluded, included): (Vec<String>, Vec<String>) = inputs
            .into_iter()
            .map(Into::into)
            .partition(|path| matcher.is_excluded(path));

        Ok(Self {
            mode,
            included,
            excluded,
            signing,
        })
    }

    pub fn is_signed(&self) -> bool {
        self.signing.is_some()
    }
}
