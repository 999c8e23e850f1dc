//! Cohort assignment output.

use serde::{Deserialize, Serialize};

use crate::routing::document::CohortSpec;
use crate::routing::ids::{ClientId, CohortName};

/// Generated cohorts for one strategy.
///
/// ```yaml
/// cohort-strategy-name: mod100
/// cohorts:
///   - cohort-name: mod100-cohort-07
///     client-ids: [7, 107]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CohortAssignment {
    pub cohort_strategy_name: String,

    /// In order of first appearance; each id appears in exactly one cohort.
    pub cohorts: Vec<CohortSpec>,
}

impl CohortAssignment {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// YAML document, starting with a `---` marker.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        Ok(format!("---\n{}", serde_yaml::to_string(self)?))
    }

    pub fn client_count(&self) -> usize {
        self.cohorts.iter().map(|c| c.client_ids.len()).sum()
    }
}

/// Accumulates ids into up to 100 numbered cohorts.
pub(crate) struct Buckets {
    prefix: &'static str,
    slots: [Option<usize>; 100],
    cohorts: Vec<CohortSpec>,
}

impl Buckets {
    pub(crate) fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            slots: [None; 100],
            cohorts: Vec::new(),
        }
    }

    /// `bucket` must be below 100.
    pub(crate) fn push(&mut self, bucket: u64, id: ClientId) {
        let slot = bucket as usize;
        let index = match self.slots[slot] {
            Some(index) => index,
            None => {
                self.cohorts.push(CohortSpec {
                    cohort_name: CohortName::new(format!("{}-cohort-{:02}", self.prefix, bucket)),
                    client_ids: Vec::new(),
                });
                let index = self.cohorts.len() - 1;
                self.slots[slot] = Some(index);
                index
            }
        };
        self.cohorts[index].client_ids.push(id);
    }

    pub(crate) fn finish(self) -> CohortAssignment {
        CohortAssignment {
            cohort_strategy_name: self.prefix.to_string(),
            cohorts: self.cohorts,
        }
    }
}
