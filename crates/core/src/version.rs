//! Version types, display titles and input validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::numbering::VersionNumber;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum content length in characters.
pub const MAX_CONTENT_LENGTH: usize = 100_000;

/// Maximum user id length in characters.
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;

/// Number of versions returned by a listing when no limit is given.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Upper bound on a listing page.
pub const MAX_LIST_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// VersionType
// ---------------------------------------------------------------------------

/// Provenance of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    /// Saved by hand. Rollbacks are recorded as saves as well.
    Save,
    /// Produced by an optimization pass.
    Optimize,
}

impl VersionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            VersionType::Save => "save",
            VersionType::Optimize => "optimize",
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "save" => Ok(VersionType::Save),
            "optimize" => Ok(VersionType::Optimize),
            other => Err(CoreError::Validation(format!(
                "Invalid version type '{other}'. Must be one of: save, optimize"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// Display title of a version, e.g. `"product marketing v1.2 (save)"`.
pub fn formatted_title(topic: &str, number: VersionNumber, version_type: VersionType) -> String {
    format!("{topic} v{number} ({version_type})")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Content must contain something other than whitespace and stay within
/// [`MAX_CONTENT_LENGTH`].
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation(
            "Content must not be empty".to_string(),
        ));
    }
    let len = content.chars().count();
    if len > MAX_CONTENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Content exceeds maximum length of {MAX_CONTENT_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// User ids are opaque but must be non-blank and bounded.
pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if user_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "User id must not be empty".to_string(),
        ));
    }
    let len = user_id.chars().count();
    if len > MAX_USER_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "User id exceeds maximum length of {MAX_USER_ID_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate an optional description: length check only.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Clamp a user-provided limit to `[0, max]`, using `default` when absent.
///
/// Never raises a limit: a request for zero items gets zero.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(0, max)
}
