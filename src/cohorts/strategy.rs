//! Bucketing strategies.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cohorts::assignment::{Buckets, CohortAssignment};
use crate::cohorts::range::ClientIdRange;
use crate::cohorts::ValidationError;

/// Names accepted by [`CohortStrategy::from_name`].
pub const SUPPORTED_STRATEGIES: &[&str] = &["mod100", "random"];

/// How client ids are spread over cohorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortStrategy {
    /// `id % 100` picks one of 100 cohorts.
    Mod100,
    /// Each id draws one of 100 cohorts from a seeded generator.
    Random { seed: u64 },
}

impl CohortStrategy {
    pub fn from_name(name: &str, seed: u64) -> Result<Self, ValidationError> {
        match name {
            "mod100" => Ok(CohortStrategy::Mod100),
            "random" => Ok(CohortStrategy::Random { seed }),
            other => Err(ValidationError::UnsupportedStrategy {
                name: other.to_string(),
                supported: SUPPORTED_STRATEGIES.join(", "),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CohortStrategy::Mod100 => "mod100",
            CohortStrategy::Random { .. } => "random",
        }
    }

    /// Bucket every id of `ranges`. Ranges are walked in the order given.
    pub fn assign(&self, ranges: &[ClientIdRange]) -> CohortAssignment {
        let ids = ranges.iter().flat_map(ClientIdRange::ids);
        let mut buckets = Buckets::new(self.name());

        match *self {
            CohortStrategy::Mod100 => {
                for id in ids {
                    buckets.push(id.0 % 100, id);
                }
            }
            CohortStrategy::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                for id in ids {
                    buckets.push(rng.gen_range(0..100), id);
                }
            }
        }

        buckets.finish()
    }
}

impl fmt::Display for CohortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ids::ClientId;
    use std::collections::HashSet;

    #[test]
    fn test_from_name() {
        assert_eq!(CohortStrategy::from_name("mod100", 0).unwrap(), CohortStrategy::Mod100);
        assert_eq!(
            CohortStrategy::from_name("random", 9).unwrap(),
            CohortStrategy::Random { seed: 9 }
        );
        match CohortStrategy::from_name("mod10", 0) {
            Err(ValidationError::UnsupportedStrategy { name, supported }) => {
                assert_eq!(name, "mod10");
                assert_eq!(supported, "mod100, random");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_mod100_first_appearance_order() {
        let ranges = [ClientIdRange::new(98, 101)];
        let assignment = CohortStrategy::Mod100.assign(&ranges);
        let names: Vec<&str> = assignment.cohorts.iter().map(|c| c.cohort_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["mod100-cohort-98", "mod100-cohort-99", "mod100-cohort-00", "mod100-cohort-01"]
        );
    }

    #[test]
    fn test_mod100_depends_only_on_residue() {
        let ranges = [ClientIdRange::new(0, 349), ClientIdRange::single(1_000_042)];
        let assignment = CohortStrategy::Mod100.assign(&ranges);
        assert_eq!(assignment.cohorts.len(), 100);

        for cohort in &assignment.cohorts {
            let residues: HashSet<u64> = cohort.client_ids.iter().map(|id| id.0 % 100).collect();
            assert_eq!(residues.len(), 1);
            let residue = residues.into_iter().next().unwrap();
            assert_eq!(cohort.cohort_name.as_str(), format!("mod100-cohort-{:02}", residue));
        }

        let c42 = assignment
            .cohorts
            .iter()
            .find(|c| c.cohort_name.as_str() == "mod100-cohort-42")
            .unwrap();
        assert_eq!(
            c42.client_ids,
            vec![ClientId(42), ClientId(142), ClientId(242), ClientId(342), ClientId(1_000_042)]
        );
    }

    #[test]
    fn test_partition_covers_ranges_exactly() {
        let ranges = [ClientIdRange::new(5, 17), ClientIdRange::new(250, 420), ClientIdRange::single(999)];
        for strategy in [CohortStrategy::Mod100, CohortStrategy::Random { seed: 3 }] {
            let assignment = strategy.assign(&ranges);
            let all: Vec<ClientId> = assignment
                .cohorts
                .iter()
                .flat_map(|c| c.client_ids.iter().copied())
                .collect();
            let unique: HashSet<ClientId> = all.iter().copied().collect();
            assert_eq!(all.len(), unique.len(), "{} produced duplicates", strategy);

            let expected: HashSet<ClientId> = ranges.iter().flat_map(ClientIdRange::ids).collect();
            assert_eq!(unique, expected);
        }
    }

    #[test]
    fn test_random_is_reproducible() {
        let ranges = [ClientIdRange::new(1, 500)];
        let a = CohortStrategy::Random { seed: 11 }.assign(&ranges);
        let b = CohortStrategy::Random { seed: 11 }.assign(&ranges);
        assert_eq!(a, b);
        assert_eq!(a.cohort_strategy_name, "random");
        assert!(a.cohorts.iter().all(|c| c.cohort_name.as_str().starts_with("random-cohort-")));
    }
}
