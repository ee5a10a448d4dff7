//! Policy Authority Configuration
//!
//! Defines the static configuration of the authority:
//! - Globally enabled challenge types
//! - Hostname policy and challenges whitelist file locations
//! - Identifier length cap and shuffle seed
//! - Feature flags for challenge selection

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::challenge::ChallengeType;
use crate::error::ConfigError;
use crate::validation::DEFAULT_MAX_DNS_IDENTIFIER_LENGTH;

/// Largest name DNS can carry in presentation form
const DNS_NAME_LIMIT: usize = 253;

/// Complete authority configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Challenge type -> globally enabled
    pub challenges: HashMap<ChallengeType, bool>,
    /// JSON hostname policy (Blacklist / ExactBlacklist)
    pub hostname_policy_file: Option<PathBuf>,
    /// JSON challenges whitelist (challenge type -> account IDs)
    pub challenges_whitelist_file: Option<PathBuf>,
    /// Maximum identifier length in octets
    pub max_dns_identifier_length: usize,
    /// Seed for the challenge shuffle
    pub rng_seed: u64,
    /// Poll interval for policy file changes
    pub reload_interval_secs: u64,
    /// Challenge selection flags
    pub features: FeatureFlags,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let mut challenges = HashMap::new();
        challenges.insert(ChallengeType::Http01, true);
        challenges.insert(ChallengeType::TlsAlpn01, true);
        challenges.insert(ChallengeType::Dns01, true);

        Self {
            challenges,
            hostname_policy_file: None,
            challenges_whitelist_file: None,
            max_dns_identifier_length: DEFAULT_MAX_DNS_IDENTIFIER_LENGTH,
            rng_seed: 99,
            reload_interval_secs: 5,
            features: FeatureFlags::default(),
        }
    }
}

/// Feature flags consumed by the challenge selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// All challenges created in one call share a single token
    pub single_token: bool,
    /// Offer TLS-SNI-01 on revalidation even when it is not enabled
    pub tls_sni_revalidation: bool,
}

impl PolicyConfig {
    /// Load from a TOML file, or YAML when the extension is `.yaml`/`.yml`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: PolicyConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dns_identifier_length == 0 {
            return Err(ConfigError::Invalid(
                "max_dns_identifier_length must be positive".to_string(),
            ));
        }
        if self.max_dns_identifier_length > DNS_NAME_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_dns_identifier_length {} exceeds the DNS limit of {}",
                self.max_dns_identifier_length, DNS_NAME_LIMIT
            )));
        }
        if self.reload_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reload_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PolicyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_dns_identifier_length, 230);
        assert_eq!(config.challenges.get(&ChallengeType::Dns01), Some(&true));
        assert_eq!(config.challenges.get(&ChallengeType::TlsSni01), None);
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
hostname_policy_file = "/etc/pa/hostname-policy.json"
rng_seed = 7

[challenges]
"http-01" = true
"dns-01" = false

[features]
single_token = true
"#
        )
        .unwrap();

        let config = PolicyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.challenges.len(), 2);
        assert_eq!(config.challenges.get(&ChallengeType::Dns01), Some(&false));
        assert!(config.features.single_token);
        assert!(!config.features.tls_sni_revalidation);
        assert_eq!(config.max_dns_identifier_length, 230);
        assert_eq!(
            config.hostname_policy_file,
            Some(PathBuf::from("/etc/pa/hostname-policy.json"))
        );
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "challenges:\n  tls-alpn-01: true\nmax_dns_identifier_length: 253\nfeatures:\n  tls_sni_revalidation: true\n"
        )
        .unwrap();

        let config = PolicyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_dns_identifier_length, 253);
        assert_eq!(config.challenges.get(&ChallengeType::TlsAlpn01), Some(&true));
        assert!(config.features.tls_sni_revalidation);
    }

    #[test]
    fn test_invalid_config() {
        let config = PolicyConfig {
            max_dns_identifier_length: 300,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PolicyConfig {
            reload_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
