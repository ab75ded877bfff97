//! Protocol version registry

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A known revision of the universal trace schema.
///
/// The registry is closed: any `protocol_version` string that does not
/// parse into one of these variants is rejected by validation. New
/// revisions are added as variants so older data keeps validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProtocolVersion {
    /// Universal trace format 1.0
    #[default]
    #[serde(rename = "1.0")]
    V1_0,
}

impl ProtocolVersion {
    /// Version written by producers today
    pub const CURRENT: Self = Self::V1_0;

    /// Every version the registry knows about
    pub const ALL: &'static [Self] = &[Self::V1_0];

    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
        }
    }

    /// Whether `value` names a registered version
    pub fn is_supported(value: &str) -> bool {
        value.parse::<Self>().is_ok()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("Unsupported protocol version: {s}"))
    }
}
