//! Identifiers a certificate can be requested for

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier type. Only DNS names are issuable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    Dns,
    #[serde(other)]
    Unsupported,
}

/// A typed identifier, e.g. `{"type": "dns", "value": "example.com"}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: IdentifierType,
    /// Expected to be lowercased by the caller
    pub value: String,
}

impl Identifier {
    pub fn dns(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierType::Dns,
            value: value.into(),
        }
    }

    /// True if the value uses the `*.` wildcard prefix
    pub fn is_wildcard(&self) -> bool {
        self.value.starts_with("*.")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IdentifierType::Dns => write!(f, "dns:{}", self.value),
            IdentifierType::Unsupported => write!(f, "unsupported:{}", self.value),
        }
    }
}
