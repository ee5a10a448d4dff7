//! Hostname Blacklist
//!
//! Immutable snapshot of the hostname policy file:
//! - `blacklist`: suffix patterns, any label-wise suffix of a name may match
//! - `exact_blacklist`: whole-name matches only
//! - `wildcard_exact_blacklist`: parents of exact entries, blocking wildcards
//!   that would cover an exact entry
//!
//! A snapshot is built in full before it replaces the previous one, so a bad
//! file never leaves a partial policy behind.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{LoadError, PolicyError, Result};

/// On-disk hostname policy document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostnamePolicyFile {
    #[serde(rename = "Blacklist", default)]
    pub blacklist: Vec<String>,
    #[serde(rename = "ExactBlacklist", default)]
    pub exact_blacklist: Vec<String>,
}

/// Parsed hostname policy
#[derive(Debug, Clone, Default)]
pub struct HostnamePolicy {
    blacklist: HashSet<String>,
    exact_blacklist: HashSet<String>,
    wildcard_exact_blacklist: HashSet<String>,
}

impl HostnamePolicy {
    /// Parse a JSON hostname policy document
    pub fn from_json(raw: &[u8]) -> std::result::Result<Self, LoadError> {
        let file: HostnamePolicyFile = serde_json::from_slice(raw)?;
        Self::from_file(file)
    }

    pub fn from_file(file: HostnamePolicyFile) -> std::result::Result<Self, LoadError> {
        // An empty blacklist is always a mistake, never a request to stop blocking
        if file.blacklist.is_empty() {
            return Err(LoadError::NoEntries);
        }

        let blacklist: HashSet<String> = file.blacklist.into_iter().collect();

        let mut exact_blacklist = HashSet::new();
        let mut wildcard_exact_blacklist = HashSet::new();
        for entry in file.exact_blacklist {
            // "highvalue.example.com" blocks "*.example.com"
            let parent = match entry.split_once('.') {
                Some((_, parent)) => parent.to_string(),
                None => return Err(LoadError::MalformedExactEntry(entry)),
            };
            wildcard_exact_blacklist.insert(parent);
            exact_blacklist.insert(entry);
        }

        Ok(Self {
            blacklist,
            exact_blacklist,
            wildcard_exact_blacklist,
        })
    }

    /// Check `domain` and each of its label-wise suffixes against the
    /// blacklist, then the full name against the exact blacklist.
    pub fn check_host_lists(&self, domain: &str) -> Result<()> {
        let mut suffix = domain;
        loop {
            if self.blacklist.contains(suffix) {
                return Err(PolicyError::Blacklisted);
            }
            match suffix.split_once('.') {
                Some((_, rest)) => suffix = rest,
                None => break,
            }
        }

        if self.exact_blacklist.contains(domain) {
            return Err(PolicyError::Blacklisted);
        }
        Ok(())
    }

    /// Exact lookup of a wildcard's base domain. Only direct parents of exact
    /// entries are blocked, not deeper ancestors.
    pub fn check_wildcard(&self, base_domain: &str) -> Result<()> {
        if self.wildcard_exact_blacklist.contains(base_domain) {
            return Err(PolicyError::Blacklisted);
        }
        Ok(())
    }

    pub fn blacklist(&self) -> &HashSet<String> {
        &self.blacklist
    }

    pub fn exact_blacklist(&self) -> &HashSet<String> {
        &self.exact_blacklist
    }

    pub fn wildcard_exact_blacklist(&self) -> &HashSet<String> {
        &self.wildcard_exact_blacklist
    }
}
