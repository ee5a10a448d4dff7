//! Issuance Policy Authority
//!
//! Decides whether a certificate authority is willing to issue for a DNS
//! identifier and which validation challenges the requester must complete.
//!
//! ## Module Structure
//!
//! - `authority`: the `PolicyAuthority` facade and its reload hooks
//! - `validation`: DNS name syntax rules
//! - `hostname_policy`: hostname blacklist snapshot
//! - `allowlist`: per-challenge-type account whitelist snapshot
//! - `selector`: challenge selection and shuffling
//! - `suffix`: public suffix lookup
//! - `reloader`: policy file polling
//! - `config`: static configuration

pub mod allowlist;
pub mod authority;
pub mod challenge;
pub mod config;
pub mod error;
pub mod hostname_policy;
pub mod identifier;
pub mod reloader;
pub mod selector;
pub mod suffix;
pub mod validation;

pub use allowlist::ChallengeAllowlist;
pub use authority::PolicyAuthority;
pub use challenge::{new_token, Challenge, ChallengeStatus, ChallengeType};
pub use config::{FeatureFlags, PolicyConfig};
pub use error::{ConfigError, ErrorKind, LoadError, PolicyError};
pub use hostname_policy::{HostnamePolicy, HostnamePolicyFile};
pub use identifier::{Identifier, IdentifierType};
pub use reloader::Reloader;
pub use selector::{ChallengeSelector, ChallengeSet};
pub use suffix::{IcannSuffixList, StaticSuffixList, SuffixError, SuffixLookup};
pub use validation::{validate_dns_name, DEFAULT_MAX_DNS_IDENTIFIER_LENGTH};
