//! Challenge selection
//!
//! Decides which challenge types an identifier is offered and shuffles them
//! so clients cannot rely on a fixed order. The shuffle uses a seeded,
//! non-cryptographic generator: positions should not be predictable from the
//! outside, but they are not secret and reproducible runs are fine.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::challenge::{new_token, Challenge, ChallengeType};
use crate::config::FeatureFlags;
use crate::error::{PolicyError, Result};
use crate::identifier::Identifier;

/// Challenges offered for one identifier and the index sets that satisfy it
pub type ChallengeSet = (Vec<Challenge>, Vec<Vec<usize>>);

pub struct ChallengeSelector {
    features: FeatureFlags,
    /// Draws must not interleave between concurrent callers
    rng: Mutex<StdRng>,
}

impl ChallengeSelector {
    pub fn new(features: FeatureFlags, seed: u64) -> Self {
        Self {
            features,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build the shuffled challenge list and combinations for `identifier`.
    /// `enabled` answers whether a challenge type may be used by the requester.
    pub fn select<F>(
        &self,
        identifier: &Identifier,
        revalidation: bool,
        enabled: F,
    ) -> Result<ChallengeSet>
    where
        F: Fn(ChallengeType) -> bool,
    {
        // An empty token makes each challenge generate its own
        let token = if self.features.single_token {
            new_token()
        } else {
            String::new()
        };

        let mut challenges = Vec::new();
        if identifier.is_wildcard() {
            // Wildcards can only be proven over DNS
            if !enabled(ChallengeType::Dns01) {
                return Err(PolicyError::WildcardRequiresDns01);
            }
            challenges.push(Challenge::new(ChallengeType::Dns01, &token));
        } else {
            if enabled(ChallengeType::Http01) {
                challenges.push(Challenge::new(ChallengeType::Http01, &token));
            }
            if enabled(ChallengeType::TlsSni01)
                || (self.features.tls_sni_revalidation && revalidation)
            {
                challenges.push(Challenge::new(ChallengeType::TlsSni01, &token));
            }
            if enabled(ChallengeType::TlsAlpn01) {
                challenges.push(Challenge::new(ChallengeType::TlsAlpn01, &token));
            }
            if enabled(ChallengeType::Dns01) {
                challenges.push(Challenge::new(ChallengeType::Dns01, &token));
            }
        }

        let count = challenges.len();
        let mut challenge_order: Vec<usize> = (0..count).collect();
        let mut combination_order: Vec<usize> = (0..count).collect();
        {
            let mut rng = self.rng.lock();
            challenge_order.shuffle(&mut *rng);
            combination_order.shuffle(&mut *rng);
        }

        let mut slots: Vec<Option<Challenge>> = challenges.into_iter().map(Some).collect();
        let shuffled: Vec<Challenge> = challenge_order
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();
        let combinations: Vec<Vec<usize>> =
            combination_order.into_iter().map(|idx| vec![idx]).collect();

        debug!(
            "Selected {} challenges for {}: {:?}",
            shuffled.len(),
            identifier,
            shuffled.iter().map(|c| c.kind).collect::<Vec<_>>()
        );

        Ok((shuffled, combinations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_enabled(_: ChallengeType) -> bool {
        true
    }

    fn kinds(challenges: &[Challenge]) -> Vec<ChallengeType> {
        challenges.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_all_types_offered() {
        let selector = ChallengeSelector::new(FeatureFlags::default(), 99);
        let (challenges, combinations) = selector
            .select(&Identifier::dns("example.com"), false, all_enabled)
            .unwrap();

        assert_eq!(challenges.len(), 4);
        assert_eq!(combinations.len(), 4);
        let types: HashSet<_> = kinds(&challenges).into_iter().collect();
        assert_eq!(types.len(), 4);

        let mut indexes: Vec<usize> = combinations
            .iter()
            .map(|combo| {
                assert_eq!(combo.len(), 1);
                combo[0]
            })
            .collect();
        indexes.sort();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = ChallengeSelector::new(FeatureFlags::default(), 99);
        let b = ChallengeSelector::new(FeatureFlags::default(), 99);
        let id = Identifier::dns("example.com");

        for _ in 0..5 {
            let (ca, combos_a) = a.select(&id, false, all_enabled).unwrap();
            let (cb, combos_b) = b.select(&id, false, all_enabled).unwrap();
            assert_eq!(kinds(&ca), kinds(&cb));
            assert_eq!(combos_a, combos_b);
        }
    }

    #[test]
    fn test_wildcard_requires_dns01() {
        let selector = ChallengeSelector::new(FeatureFlags::default(), 99);
        let id = Identifier::dns("*.example.com");

        let result = selector.select(&id, false, |t| t != ChallengeType::Dns01);
        assert_eq!(result, Err(PolicyError::WildcardRequiresDns01));

        let (challenges, combinations) = selector.select(&id, false, all_enabled).unwrap();
        assert_eq!(kinds(&challenges), vec![ChallengeType::Dns01]);
        assert_eq!(combinations, vec![vec![0]]);
    }

    #[test]
    fn test_tls_sni_revalidation() {
        let features = FeatureFlags {
            tls_sni_revalidation: true,
            ..Default::default()
        };
        let selector = ChallengeSelector::new(features, 99);
        let id = Identifier::dns("example.com");
        let only_http = |t: ChallengeType| t == ChallengeType::Http01;

        let (challenges, _) = selector.select(&id, false, only_http).unwrap();
        assert_eq!(kinds(&challenges), vec![ChallengeType::Http01]);

        let (challenges, _) = selector.select(&id, true, only_http).unwrap();
        let types: HashSet<_> = kinds(&challenges).into_iter().collect();
        assert!(types.contains(&ChallengeType::TlsSni01));
        assert!(types.contains(&ChallengeType::Http01));

        // Without the flag revalidation changes nothing
        let plain = ChallengeSelector::new(FeatureFlags::default(), 99);
        let (challenges, _) = plain.select(&id, true, only_http).unwrap();
        assert_eq!(kinds(&challenges), vec![ChallengeType::Http01]);
    }

    #[test]
    fn test_token_modes() {
        let id = Identifier::dns("example.com");

        let shared = ChallengeSelector::new(
            FeatureFlags {
                single_token: true,
                ..Default::default()
            },
            1,
        );
        let (challenges, _) = shared.select(&id, false, all_enabled).unwrap();
        let tokens: HashSet<_> = challenges.iter().map(|c| c.token.clone()).collect();
        assert_eq!(tokens.len(), 1);

        let separate = ChallengeSelector::new(FeatureFlags::default(), 1);
        let (challenges, _) = separate.select(&id, false, all_enabled).unwrap();
        let tokens: HashSet<_> = challenges.iter().map(|c| c.token.clone()).collect();
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_nothing_enabled() {
        let selector = ChallengeSelector::new(FeatureFlags::default(), 99);
        let (challenges, combinations) = selector
            .select(&Identifier::dns("example.com"), false, |_| false)
            .unwrap();
        assert!(challenges.is_empty());
        assert!(combinations.is_empty());
    }
}
