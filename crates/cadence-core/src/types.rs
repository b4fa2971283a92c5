use std::str::FromStr;

use serde::Deserialize;

use crate::error::CoreError;

/// How closely recurrence rules are held to the RFC they claim to follow.
///
/// Two standard generations (RFC 2445 and its successor RFC 5545) crossed
/// with two strictness levels. Lax modes accept or silently correct rule
/// shapes that strict modes reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceMode {
    Rfc2445Strict,
    Rfc2445Lax,
    Rfc5545Strict,
    #[default]
    Rfc5545Lax,
}

impl ComplianceMode {
    /// Every mode, legacy generation first.
    pub const ALL: [Self; 4] = [
        Self::Rfc2445Strict,
        Self::Rfc2445Lax,
        Self::Rfc5545Strict,
        Self::Rfc5545Lax,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rfc2445Strict => "rfc2445_strict",
            Self::Rfc2445Lax => "rfc2445_lax",
            Self::Rfc5545Strict => "rfc5545_strict",
            Self::Rfc5545Lax => "rfc5545_lax",
        }
    }

    /// Returns `true` for the two strict modes.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Rfc2445Strict | Self::Rfc5545Strict)
    }

    /// Returns `true` for the legacy RFC 2445 modes.
    #[must_use]
    pub const fn is_rfc2445(self) -> bool {
        matches!(self, Self::Rfc2445Strict | Self::Rfc2445Lax)
    }
}

impl std::fmt::Display for ComplianceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceMode {
    type Err = CoreError;

    /// Accepts the snake case names as well as their kebab case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown compliance mode: {s}")))
    }
}
