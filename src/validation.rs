//! DNS Name Syntax Validation
//!
//! Syntax rules applied to a non-wildcard DNS identifier before any lookup:
//! - only LDH characters, bounded total length, not an IP literal
//! - 2 to 10 labels, each 1 to 63 octets, no leading or trailing hyphen
//! - `xn--` labels must decode to NFC-normalized Unicode
//! - other labels must not use the reserved `??--` form
//!
//! Checks run in a fixed order so the same name always yields the same error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use unicode_normalization::is_nfc;

use crate::error::{PolicyError, Result};

/// Maximum number of labels in a name
pub const MAX_LABELS: usize = 10;

/// RFC 1035 label limit
pub const MAX_LABEL_LENGTH: usize = 63;

/// Default cap on identifier length. Below the 253-octet DNS limit because
/// identifiers are stored JSON-wrapped in a 255 character column.
pub const DEFAULT_MAX_DNS_IDENTIFIER_LENGTH: usize = 230;

static DNS_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z0-9][a-z0-9-]{0,62}$").unwrap());
static PUNYCODE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^xn--").unwrap());
static RESERVED_LDH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z0-9]{2}--").unwrap());

fn is_dns_character(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'.' || ch == b'-'
}

/// Validate the syntax of a non-wildcard DNS name
pub fn validate_dns_name(domain: &str, max_length: usize) -> Result<()> {
    if domain.is_empty() {
        return Err(PolicyError::EmptyName);
    }

    if domain.starts_with("*.") {
        return Err(PolicyError::WildcardNotSupported);
    }

    if !domain.bytes().all(is_dns_character) {
        return Err(PolicyError::InvalidDnsCharacter);
    }

    if domain.len() > max_length {
        return Err(PolicyError::NameTooLong);
    }

    if domain.parse::<IpAddr>().is_ok() {
        return Err(PolicyError::IpAddress);
    }

    if domain.ends_with('.') {
        return Err(PolicyError::NameEndsInDot);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() > MAX_LABELS {
        return Err(PolicyError::TooManyLabels);
    }
    if labels.len() < 2 {
        return Err(PolicyError::TooFewLabels);
    }

    labels.into_iter().try_for_each(validate_label)
}

fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(PolicyError::LabelTooShort);
    }
    if label.len() > MAX_LABEL_LENGTH {
        return Err(PolicyError::LabelTooLong);
    }

    if !DNS_LABEL.is_match(label) || label.ends_with('-') {
        return Err(PolicyError::InvalidDnsCharacter);
    }

    if PUNYCODE_PREFIX.is_match(label) {
        // Script mixing is the registry's concern; we only require a clean encoding.
        let unicode = idna::punycode::decode_to_string(&label[4..])
            .ok_or(PolicyError::MalformedIdn)?;
        if !is_nfc(&unicode) {
            return Err(PolicyError::MalformedIdn);
        }
    } else if RESERVED_LDH.is_match(label) {
        return Err(PolicyError::InvalidRldh);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(domain: &str) -> Result<()> {
        validate_dns_name(domain, DEFAULT_MAX_DNS_IDENTIFIER_LENGTH)
    }

    #[test]
    fn test_valid_names() {
        assert!(check("example.com").is_ok());
        assert!(check("www.example-site.co.uk").is_ok());
        assert!(check("a.b").is_ok());
        assert!(check("123.example.com").is_ok());
        assert!(check("WWW.Example.COM").is_ok());
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            ("", PolicyError::EmptyName),
            ("*.example.com", PolicyError::WildcardNotSupported),
            ("under_score.example.com", PolicyError::InvalidDnsCharacter),
            ("foo.*.example.com", PolicyError::InvalidDnsCharacter),
            ("ex ample.com", PolicyError::InvalidDnsCharacter),
            ("exämple.com", PolicyError::InvalidDnsCharacter),
            ("192.0.2.1", PolicyError::IpAddress),
            ("example.com.", PolicyError::NameEndsInDot),
            ("a.b.c.d.e.f.g.h.i.j.k", PolicyError::TooManyLabels),
            ("localhost", PolicyError::TooFewLabels),
            ("foo..com", PolicyError::LabelTooShort),
            (".example.com", PolicyError::LabelTooShort),
            ("-leading.com", PolicyError::InvalidDnsCharacter),
            ("trailing-.com", PolicyError::InvalidDnsCharacter),
            ("example.com-", PolicyError::InvalidDnsCharacter),
        ];
        for (domain, expected) in cases {
            assert_eq!(check(domain), Err(expected), "domain: {:?}", domain);
        }
    }

    #[test]
    fn test_ipv6_literal_fails_on_character() {
        // ':' is not a DNS character, so this never reaches the IP check
        assert_eq!(check("2001:db8::1"), Err(PolicyError::InvalidDnsCharacter));
    }

    #[test]
    fn test_length_limits() {
        let long_label = "a".repeat(64);
        assert_eq!(
            check(&format!("{}.com", long_label)),
            Err(PolicyError::LabelTooLong)
        );
        assert!(check(&format!("{}.com", "a".repeat(63))).is_ok());

        // 4 * 57 + 3 dots = 231 octets, one past the cap
        let label = "a".repeat(57);
        let too_long = format!("{label}.{label}.{label}.{label}");
        assert_eq!(too_long.len(), 231);
        assert_eq!(check(&too_long), Err(PolicyError::NameTooLong));

        let at_cap = &too_long[1..];
        assert_eq!(at_cap.len(), 230);
        assert!(check(at_cap).is_ok());

        // A wider cap admits it
        assert!(validate_dns_name(&too_long, 253).is_ok());
    }

    #[test]
    fn test_punycode_labels() {
        // bücher
        assert!(check("xn--bcher-kva.example").is_ok());
        assert!(check("XN--BCHER-KVA.example").is_ok());
        // Not decodable
        assert_eq!(check("xn--ab-.example.com"), Err(PolicyError::InvalidDnsCharacter));
        assert_eq!(check("xn--9999999999999.com"), Err(PolicyError::MalformedIdn));
        // Decodes to "a\u{0301}", which is not NFC
        assert_eq!(check("xn--a-xbb.com"), Err(PolicyError::MalformedIdn));
    }

    #[test]
    fn test_reserved_ldh_labels() {
        assert_eq!(check("ab--c.example.com"), Err(PolicyError::InvalidRldh));
        assert_eq!(check("www.zz--test.com"), Err(PolicyError::InvalidRldh));
        assert!(check("a-b--c.example.com").is_ok());
        assert!(check("abc--d.example.com").is_ok());
    }
}
