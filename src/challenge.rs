//! Challenge types and challenge construction

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of random bytes in a challenge token
pub const TOKEN_BYTES: usize = 32;

/// Proof-of-control mechanisms a requester can be offered
///
/// Serialized by name (`"http-01"`), so it also works as a map key in
/// configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChallengeType {
    Http01,
    TlsSni01,
    TlsAlpn01,
    Dns01,
}

impl ChallengeType {
    pub const ALL: [ChallengeType; 4] = [
        ChallengeType::Http01,
        ChallengeType::TlsSni01,
        ChallengeType::TlsAlpn01,
        ChallengeType::Dns01,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Http01 => "http-01",
            ChallengeType::TlsSni01 => "tls-sni-01",
            ChallengeType::TlsAlpn01 => "tls-alpn-01",
            ChallengeType::Dns01 => "dns-01",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ChallengeType {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChallengeType> for String {
    fn from(kind: ChallengeType) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ChallengeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown challenge type: {}", s))
    }
}

/// Challenge status. Offered challenges are always pending; later states
/// belong to the validation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
}

/// A challenge offered for an identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    pub status: ChallengeStatus,
    pub token: String,
}

impl Challenge {
    /// New pending challenge. An empty token gets a freshly generated one.
    pub fn new(kind: ChallengeType, token: &str) -> Self {
        let token = if token.is_empty() {
            new_token()
        } else {
            token.to_string()
        };
        Self {
            kind,
            status: ChallengeStatus::Pending,
            token,
        }
    }
}

/// Random token: 32 bytes, base64url without padding
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
