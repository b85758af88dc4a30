//! Configuration enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How thinking-phase output is shaped for the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingMode {
    /// Discard the structural wrapper and fold the reasoning text into
    /// ordinary content
    Strip,
    /// Surface reasoning as a separate `delta.thinking` field
    #[default]
    Think,
    /// Pass the upstream text through unmodified
    Raw,
}

impl fmt::Display for ThinkingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Strip => write!(f, "strip"),
            Self::Think => write!(f, "think"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

impl FromStr for ThinkingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strip" => Ok(Self::Strip),
            "think" => Ok(Self::Think),
            "raw" => Ok(Self::Raw),
            other => Err(ConfigError::ParseError {
                message: format!("unknown thinking mode '{}' (expected strip|think|raw)", other),
            }),
        }
    }
}
