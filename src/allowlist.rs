//! Per-challenge-type account allow-list
//!
//! Lets specific accounts use a challenge type that is not globally enabled.

use std::collections::{HashMap, HashSet};

use crate::challenge::ChallengeType;
use crate::error::LoadError;

/// Parsed challenges whitelist: challenge type name -> account IDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeAllowlist {
    entries: HashMap<String, HashSet<i64>>,
}

impl ChallengeAllowlist {
    /// Parse a JSON document of the form `{"dns-01": [1, 2, 3]}`
    pub fn from_json(raw: &[u8]) -> Result<Self, LoadError> {
        let parsed: HashMap<String, Vec<i64>> = serde_json::from_slice(raw)?;
        Ok(parsed.into_iter().collect())
    }

    pub fn allows(&self, challenge: ChallengeType, account_id: i64) -> bool {
        self.entries
            .get(challenge.as_str())
            .is_some_and(|accounts| accounts.contains(&account_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<i64>)> for ChallengeAllowlist {
    fn from_iter<T: IntoIterator<Item = (String, Vec<i64>)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(kind, accounts)| (kind, accounts.into_iter().collect()))
                .collect(),
        }
    }
}
