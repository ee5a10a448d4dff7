//! Error types for the policy authority
//!
//! Decision errors (`PolicyError`) are what issuance callers see. Reload errors
//! (`LoadError`) stay inside the authority and only reach the audit log.

use thiserror::Error;

/// Result type alias for policy decisions
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Message shown to requesters for any rejected identifier
pub const GENERIC_REJECTION: &str = "Policy forbids issuing for name";

/// Response category an API layer maps a decision error to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntactically or structurally invalid, safe to echo to the requester
    Malformed,
    /// Well formed, but policy forbids it
    RejectedIdentifier,
    /// Operational failure (policy not loaded, misconfiguration)
    Internal,
}

/// Policy decision errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid identifier type")]
    InvalidIdentifier,

    #[error("Name does not end in a public suffix")]
    NonPublic,

    #[error("Name is an ICANN TLD")]
    IcannTld,

    #[error("Policy forbids issuing for name")]
    Blacklisted,

    #[error("Invalid character in DNS name")]
    InvalidDnsCharacter,

    #[error("DNS name too long")]
    NameTooLong,

    #[error("Issuance for IP addresses not supported")]
    IpAddress,

    #[error("DNS name has too many labels")]
    TooManyLabels,

    #[error("DNS name was empty")]
    EmptyName,

    #[error("DNS name ends in a period")]
    NameEndsInDot,

    #[error("DNS name does not have enough labels")]
    TooFewLabels,

    #[error("DNS label is too short")]
    LabelTooShort,

    #[error("DNS label is too long")]
    LabelTooLong,

    #[error("DNS label contains malformed punycode")]
    MalformedIdn,

    #[error("DNS name contains a R-LDH label")]
    InvalidRldh,

    #[error("DNS name had more than one wildcard")]
    TooManyWildcards,

    #[error("DNS name had a malformed wildcard label")]
    MalformedWildcard,

    #[error("DNS name was a wildcard for an ICANN TLD")]
    IcannTldWildcard,

    #[error("Wildcard names not supported")]
    WildcardNotSupported,

    #[error("Hostname policy not yet loaded")]
    PolicyNotLoaded,

    #[error("Challenges requested for wildcard identifier but DNS-01 challenge type is not enabled")]
    WildcardRequiresDns01,
}

impl PolicyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PolicyError::Blacklisted | PolicyError::InvalidRldh => ErrorKind::RejectedIdentifier,
            PolicyError::PolicyNotLoaded | PolicyError::WildcardRequiresDns01 => {
                ErrorKind::Internal
            }
            _ => ErrorKind::Malformed,
        }
    }

    /// Detail suitable for the requester. Rejections collapse to one generic
    /// message so the response does not reveal which list matched.
    pub fn public_detail(&self) -> String {
        match self.kind() {
            ErrorKind::RejectedIdentifier => GENERIC_REJECTION.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Errors raised while loading a policy file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No entries in blacklist")]
    NoEntries,

    #[error("Malformed exact blacklist entry, only one label: {0:?}")]
    MalformedExactEntry(String),

    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

/// Errors raised while loading the authority configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
