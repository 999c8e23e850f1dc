//! Offline cohort assignment.
//!
//! # Data Flow
//! ```text
//! CLI tokens ("1-5", "8", "20-30,")
//!     → range.rs (parse, sort, reject overlaps)
//!     → strategy.rs (mod100 / random bucketing)
//!     → assignment.rs (CohortAssignment, YAML fragment)
//! ```
//!
//! # Design Decisions
//! - All input is validated before any cohort is produced
//! - Output cohorts reuse the routing document's `CohortSpec`, so a
//!   fragment drops straight into a service's `service-cohorts`
//! - No shared state; one call, one result

pub mod assignment;
pub mod range;
pub mod strategy;

use thiserror::Error;

pub use assignment::CohortAssignment;
pub use range::{parse_ranges, ClientIdRange};
pub use strategy::{CohortStrategy, SUPPORTED_STRATEGIES};

/// Rejected generator input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no client ids or ranges given")]
    NoRanges,

    #[error("malformed client id range '{token}': {reason}")]
    MalformedRange { token: String, reason: String },

    #[error("client id range '{token}' has min {min} greater than max {max}")]
    InvertedRange { token: String, min: u64, max: u64 },

    #[error("overlapping client id ranges: {first} and {second}")]
    OverlappingRanges {
        first: ClientIdRange,
        second: ClientIdRange,
    },

    #[error("unsupported cohort strategy '{name}'; supported strategies: {supported}")]
    UnsupportedStrategy { name: String, supported: String },
}

/// Parse `tokens` and bucket every covered id with `strategy`.
pub fn assign_cohorts<S: AsRef<str>>(
    tokens: &[S],
    strategy: CohortStrategy,
) -> Result<CohortAssignment, ValidationError> {
    let ranges = parse_ranges(tokens)?;
    tracing::debug!(
        ranges = ?ranges.iter().map(ToString::to_string).collect::<Vec<_>>(),
        clients = range::total_count(&ranges),
        strategy = %strategy,
        "Assigning cohorts"
    );
    Ok(strategy.assign(&ranges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_cohorts() {
        let assignment = assign_cohorts(&["1-3", "101"], CohortStrategy::Mod100).unwrap();
        assert_eq!(assignment.cohort_strategy_name, "mod100");
        assert_eq!(assignment.cohorts.len(), 3);
        assert_eq!(assignment.cohorts[0].cohort_name.as_str(), "mod100-cohort-01");
        assert_eq!(assignment.cohorts[0].client_ids.len(), 2);
        assert_eq!(assignment.client_count(), 4);
    }

    #[test]
    fn test_overlap_error_names_ranges() {
        let err = assign_cohorts(&["1-5", "5-10"], CohortStrategy::Mod100).unwrap_err();
        assert_eq!(err.to_string(), "overlapping client id ranges: 1-5 and 5-10");
    }
}
