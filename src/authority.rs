//! Policy Authority
//!
//! Entry point for every issuance decision:
//! - `willing_to_issue` / `willing_to_issue_wildcard` admit or refuse an identifier
//! - `challenges_for` picks the challenges a requester must complete
//! - `challenge_type_enabled` answers per-account challenge availability
//!
//! The hostname policy and the challenges whitelist are hot-reloaded snapshots
//! behind one read/write lock. A reload parses outside the lock and swaps
//! inside it; a failed reload leaves the previous snapshot in place. Until the
//! first hostname policy is loaded every hostname check fails closed.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::allowlist::ChallengeAllowlist;
use crate::challenge::ChallengeType;
use crate::config::PolicyConfig;
use crate::error::{LoadError, PolicyError, Result};
use crate::hostname_policy::HostnamePolicy;
use crate::identifier::{Identifier, IdentifierType};
use crate::reloader::Reloader;
use crate::selector::{ChallengeSelector, ChallengeSet};
use crate::suffix::{IcannSuffixList, SuffixLookup};
use crate::validation::validate_dns_name;

/// Reloadable state, always read and replaced under one lock
#[derive(Default)]
struct PolicyState {
    hostname_policy: Option<HostnamePolicy>,
    challenges_whitelist: Option<ChallengeAllowlist>,
}

pub struct PolicyAuthority {
    state: RwLock<PolicyState>,
    /// Fixed for the lifetime of the process
    enabled_challenges: HashMap<ChallengeType, bool>,
    selector: ChallengeSelector,
    suffixes: Arc<dyn SuffixLookup>,
    max_dns_identifier_length: usize,
    reload_interval: Duration,
}

impl PolicyAuthority {
    /// Authority with the given globally enabled challenge types and defaults
    /// for everything else.
    pub fn new(enabled_challenges: HashMap<ChallengeType, bool>) -> Self {
        Self::from_config(&PolicyConfig {
            challenges: enabled_challenges,
            ..Default::default()
        })
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            state: RwLock::new(PolicyState::default()),
            enabled_challenges: config.challenges.clone(),
            selector: ChallengeSelector::new(config.features.clone(), config.rng_seed),
            suffixes: Arc::new(IcannSuffixList),
            max_dns_identifier_length: config.max_dns_identifier_length,
            reload_interval: config.reload_interval(),
        }
    }

    /// Replace the public suffix collaborator
    pub fn with_suffix_lookup(mut self, suffixes: impl SuffixLookup + 'static) -> Self {
        self.suffixes = Arc::new(suffixes);
        self
    }

    // ========================================================================
    // RELOAD HOOKS
    // ========================================================================

    /// Parse a hostname policy document and swap it in
    pub fn load_hostname_policy(&self, raw: &[u8]) -> std::result::Result<(), LoadError> {
        info!("loading hostname policy, sha256: {}", fingerprint(raw));
        let policy = HostnamePolicy::from_json(raw)?;
        info!(
            "Loaded hostname policy: {} blacklist, {} exact, {} wildcard-exact entries",
            policy.blacklist().len(),
            policy.exact_blacklist().len(),
            policy.wildcard_exact_blacklist().len()
        );
        self.state.write().hostname_policy = Some(policy);
        Ok(())
    }

    /// Parse a challenges whitelist document and swap it in
    pub fn load_challenges_whitelist(&self, raw: &[u8]) -> std::result::Result<(), LoadError> {
        info!("loading challenges whitelist, sha256: {}", fingerprint(raw));
        let whitelist = ChallengeAllowlist::from_json(raw)?;
        self.state.write().challenges_whitelist = Some(whitelist);
        Ok(())
    }

    /// Load the hostname policy from `path` and keep it in sync with the file
    pub fn set_hostname_policy_file(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
    ) -> std::result::Result<Reloader, LoadError> {
        let pa = Arc::clone(self);
        Reloader::new(
            path,
            self.reload_interval,
            move |raw: &[u8]| pa.load_hostname_policy(raw),
            |e| error!(target: "audit", "error loading hostname policy: {}", e),
        )
    }

    /// Load the challenges whitelist from `path` and keep it in sync with the file
    pub fn set_challenges_whitelist_file(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
    ) -> std::result::Result<Reloader, LoadError> {
        let pa = Arc::clone(self);
        Reloader::new(
            path,
            self.reload_interval,
            move |raw: &[u8]| pa.load_challenges_whitelist(raw),
            |e| error!(target: "audit", "error loading challenges whitelist: {}", e),
        )
    }

    // ========================================================================
    // IDENTIFIER POLICY
    // ========================================================================

    /// Decide whether we will issue for a non-wildcard DNS identifier.
    ///
    /// The value must already be lowercase; it is not normalized here.
    /// Returned errors are either malformed-request or rejected-identifier
    /// errors, except `PolicyNotLoaded` before the first hostname policy load.
    pub fn willing_to_issue(&self, id: &Identifier) -> Result<()> {
        if id.kind != IdentifierType::Dns {
            return Err(PolicyError::InvalidIdentifier);
        }
        let domain = id.value.as_str();

        validate_dns_name(domain, self.max_dns_identifier_length)?;

        // Must end in an ICANN TLD without being one
        let icann_tld = self
            .suffixes
            .extract_suffix(domain)
            .map_err(|_| PolicyError::NonPublic)?;
        if icann_tld == domain {
            return Err(PolicyError::IcannTld);
        }

        self.check_host_lists(domain)
    }

    /// Like `willing_to_issue`, but also accepts a single leading `*.` label.
    /// The wildcard may not sit directly on an ICANN TLD and may not cover an
    /// exact blacklist entry.
    pub fn willing_to_issue_wildcard(&self, id: &Identifier) -> Result<()> {
        if id.kind != IdentifierType::Dns {
            return Err(PolicyError::InvalidIdentifier);
        }
        let raw = id.value.as_str();

        match raw.matches('*').count() {
            0 => self.willing_to_issue(id),
            1 => {
                let base_domain = raw
                    .strip_prefix("*.")
                    .ok_or(PolicyError::MalformedWildcard)?;

                let icann_tld = self
                    .suffixes
                    .extract_suffix(base_domain)
                    .map_err(|_| PolicyError::NonPublic)?;
                // No `*.com`
                if base_domain == icann_tld {
                    return Err(PolicyError::IcannTldWildcard);
                }

                self.check_wildcard_host_list(base_domain)?;

                // Substitute a literal label so the exact blacklist sees
                // "x.example.com" rather than "example.com".
                self.willing_to_issue(&Identifier::dns(format!("x.{}", base_domain)))
            }
            _ => Err(PolicyError::TooManyWildcards),
        }
    }

    /// Suffix and exact blacklist checks for `domain`
    pub fn check_host_lists(&self, domain: &str) -> Result<()> {
        let state = self.state.read();
        let policy = state
            .hostname_policy
            .as_ref()
            .ok_or(PolicyError::PolicyNotLoaded)?;
        let result = policy.check_host_lists(domain);
        if result.is_err() {
            debug!("Hostname policy forbids {}", domain);
        }
        result
    }

    /// Wildcard exact blacklist check for a wildcard's base domain
    pub fn check_wildcard_host_list(&self, base_domain: &str) -> Result<()> {
        let state = self.state.read();
        let policy = state
            .hostname_policy
            .as_ref()
            .ok_or(PolicyError::PolicyNotLoaded)?;
        policy.check_wildcard(base_domain)
    }

    // ========================================================================
    // CHALLENGES
    // ========================================================================

    /// Challenges and combinations acceptable for `identifier`, in shuffled
    /// order. Every challenge is a complete combination on its own.
    pub fn challenges_for(
        &self,
        identifier: &Identifier,
        account_id: i64,
        revalidation: bool,
    ) -> Result<ChallengeSet> {
        self.selector.select(identifier, revalidation, |kind| {
            self.challenge_type_enabled(kind, account_id)
        })
    }

    /// True if `kind` is globally enabled or whitelisted for the account
    pub fn challenge_type_enabled(&self, kind: ChallengeType, account_id: i64) -> bool {
        let state = self.state.read();
        self.enabled_challenges.get(&kind).copied().unwrap_or(false)
            || state
                .challenges_whitelist
                .as_ref()
                .is_some_and(|whitelist| whitelist.allows(kind, account_id))
    }
}

fn fingerprint(raw: &[u8]) -> String {
    hex::encode(Sha256::digest(raw))
}
