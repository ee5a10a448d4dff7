//! Public suffix lookup
//!
//! The authority only needs one question answered: which registry-operated
//! suffix does a name end in. `SuffixLookup` is that seam; the default
//! implementation answers from the ICANN section of the public suffix list.

use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuffixError {
    #[error("No public suffix found for {0}")]
    NotFound(String),
}

/// Resolves the public suffix of a domain. An error means no public suffix
/// exists; callers treat that as a policy rejection, not a fault.
pub trait SuffixLookup: Send + Sync {
    fn extract_suffix(&self, domain: &str) -> Result<String, SuffixError>;
}

/// ICANN suffixes from the compiled-in public suffix list
#[derive(Debug, Clone, Copy, Default)]
pub struct IcannSuffixList;

impl SuffixLookup for IcannSuffixList {
    fn extract_suffix(&self, domain: &str) -> Result<String, SuffixError> {
        let mut candidate = domain.to_string();
        loop {
            let name = addr::parse_domain_name(&candidate)
                .map_err(|_| SuffixError::NotFound(domain.to_string()))?;
            if !name.has_known_suffix() {
                return Err(SuffixError::NotFound(domain.to_string()));
            }
            if name.is_icann() {
                return Ok(name.suffix().to_string());
            }
            // Private-section rule (e.g. blogspot.com): keep walking down to
            // the ICANN suffix it is registered under.
            let next = match name.suffix().split_once('.') {
                Some((_, rest)) => rest.to_string(),
                None => return Err(SuffixError::NotFound(domain.to_string())),
            };
            candidate = next;
        }
    }
}

/// Fixed suffix set, longest match wins
#[derive(Debug, Clone, Default)]
pub struct StaticSuffixList {
    suffixes: HashSet<String>,
}

impl StaticSuffixList {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl SuffixLookup for StaticSuffixList {
    fn extract_suffix(&self, domain: &str) -> Result<String, SuffixError> {
        let mut rest = domain;
        loop {
            if self.suffixes.contains(rest) {
                return Ok(rest.to_string());
            }
            match rest.split_once('.') {
                Some((_, tail)) => rest = tail,
                None => return Err(SuffixError::NotFound(domain.to_string())),
            }
        }
    }
}
