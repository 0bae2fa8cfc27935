use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Granted permission pattern.
///
/// Patterns are dot-separated segments (e.g. `"api.mettbot.status"`) that may
/// end in a single `*`:
///
/// - `"*"` matches every required permission;
/// - `"api.mettbot.*"` matches any required string starting with
///   `"api.mettbot."` (raw string prefix, not segment-aware);
/// - anything else must match exactly.
///
/// A pattern can only be obtained through [`PermissionPattern::parse`] (or
/// deserialization, which goes through it), so malformed patterns are rejected
/// when the policy is loaded and never reach a decision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionPattern(Cow<'static, str>);

impl PermissionPattern {
    /// The pattern that grants everything.
    pub const WILDCARD: &'static str = "*";

    pub fn parse(raw: impl Into<Cow<'static, str>>) -> Result<Self, PolicyError> {
        let raw = raw.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    pub fn wildcard() -> Self {
        Self(Cow::Borrowed(Self::WILDCARD))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == Self::WILDCARD
    }

    /// Does this granted pattern satisfy `required`?
    pub fn matches(&self, required: &str) -> bool {
        matches(self.as_str(), required)
    }
}

/// Compare one granted pattern against one required permission string.
///
/// Pure and infallible; the only work beyond comparison is slicing off the
/// trailing `*`.
pub fn matches(granted: &str, required: &str) -> bool {
    if granted == PermissionPattern::WILDCARD {
        true
    } else if let Some(prefix) = granted.strip_suffix('*') {
        required.starts_with(prefix)
    } else {
        granted == required
    }
}

fn validate(raw: &str) -> Result<(), PolicyError> {
    if raw.is_empty() {
        return Err(PolicyError::invalid_pattern(raw, "pattern is empty"));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(PolicyError::invalid_pattern(raw, "whitespace is not allowed"));
    }

    let (body, wildcard) = match raw.strip_suffix('*') {
        Some(body) => (body, true),
        None => (raw, false),
    };
    if body.contains('*') {
        return Err(PolicyError::invalid_pattern(
            raw,
            "'*' may only appear once, as the final character",
        ));
    }
    if body.is_empty() {
        // Bare "*".
        return Ok(());
    }

    let segments: Vec<&str> = body.split('.').collect();
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        // "api.*" leaves an empty tail segment in front of the wildcard.
        if segment.is_empty() && !(wildcard && i == last) {
            return Err(PolicyError::invalid_pattern(raw, "empty segment"));
        }
    }

    Ok(())
}

impl TryFrom<String> for PermissionPattern {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PermissionPattern> for String {
    fn from(value: PermissionPattern) -> Self {
        value.0.into_owned()
    }
}

impl core::fmt::Display for PermissionPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
