//! Branch names.
//!
//! A [`BranchName`] is an opaque, comparable identifier for one line of
//! history. Names follow git-style rules so they can be used as keys in any
//! tag store backend:
//!
//! - non-empty
//! - no whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - no `..` and no `@{`
//! - must not start or end with `.` or `/`, must not end with `.lock`
//! - no empty components (`//`) and no component starting with `.`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Name of a branch.
///
/// `BranchName::default()` is `master`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// The distinguished default branch.
    pub const MASTER: &'static str = "master";

    /// Validate and wrap a branch name.
    ///
    /// ```
    /// use arbor_types::BranchName;
    ///
    /// assert!(BranchName::new("feature/auth").is_ok());
    /// assert!(BranchName::new("bad..name").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    pub fn master() -> Self {
        Self(Self::MASTER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn validate(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

impl Default for BranchName {
    fn default() -> Self {
        Self::master()
    }
}

impl FromStr for BranchName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BranchName({})", self.0)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
