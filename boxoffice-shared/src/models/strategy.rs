use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concurrency-control strategy used by the seat lifecycle operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Version-checked conditional writes against the seat row
    #[default]
    #[serde(alias = "occ")]
    Optimistic,
    /// Set-if-absent lease in an external key-value store
    #[serde(alias = "lease", alias = "redis")]
    LeaseBased,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Optimistic => "optimistic",
            StrategyKind::LeaseBased => "lease-based",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" | "occ" => Ok(StrategyKind::Optimistic),
            "lease-based" | "lease" | "redis" => Ok(StrategyKind::LeaseBased),
            other => Err(format!("unknown reservation strategy: {}", other)),
        }
    }
}
