//! Routing vocabulary: what kind of generation, and where a backend runs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The functional purpose of a generation request
///
/// A role says what is being asked for, never which backend answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    Planner,
    Coder,
    Reviewer,
}

impl ModelRole {
    pub const ALL: [ModelRole; 3] = [ModelRole::Planner, ModelRole::Coder, ModelRole::Reviewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Planner => "planner",
            ModelRole::Coder => "coder",
            ModelRole::Reviewer => "reviewer",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planner" => Ok(ModelRole::Planner),
            "coder" => Ok(ModelRole::Coder),
            "reviewer" => Ok(ModelRole::Reviewer),
            other => Err(format!("Unknown role '{}'. Expected planner, coder or reviewer", other)),
        }
    }
}

/// Where a backend executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locality {
    /// On this machine, no network credentials needed
    Local,
    /// Hosted API reached over the network with a credential
    Remote,
}

impl std::fmt::Display for Locality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locality::Local => write!(f, "local"),
            Locality::Remote => write!(f, "remote"),
        }
    }
}
