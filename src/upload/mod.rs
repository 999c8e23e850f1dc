//! Upload of configuration fragments into a key-value store.
//!
//! # Data Flow
//! ```text
//! cohort assignment YAML → CohortAssignment ─┐
//!                                            ├→ keys.rs → ConfigSink::put
//! routing document YAML  → RoutingTable  ────┘
//! ```
//!
//! # Design Decisions
//! - Documents are fully parsed and validated before the first write
//! - The router never reads from a sink; sinks are write-only here

pub mod keys;
pub mod redis_sink;
pub mod sink;

pub use redis_sink::{RedisSettings, RedisSink};
pub use sink::{ConfigSink, MemorySink, SinkError};

use crate::cohorts::CohortAssignment;
use crate::routing::RoutingTable;

/// Write one `cohort-name:<strategy>:<client-id>` key per client.
///
/// Returns the number of keys written.
pub async fn upload_cohort_assignments<S: ConfigSink + ?Sized>(
    sink: &S,
    assignment: &CohortAssignment,
) -> Result<usize, SinkError> {
    let mut written = 0;
    for cohort in &assignment.cohorts {
        for &client in &cohort.client_ids {
            let key = keys::cohort_name(&assignment.cohort_strategy_name, client);
            tracing::debug!(key = %key, cohort = %cohort.cohort_name, "Adding cohort assignment");
            sink.put(&key, cohort.cohort_name.as_str()).await?;
            written += 1;
        }
    }

    tracing::info!(
        sink = sink.name(),
        strategy = %assignment.cohort_strategy_name,
        keys = written,
        "Uploaded cohort assignments"
    );
    Ok(written)
}

/// Write cohort → treatment and treatment → route keys for every service.
///
/// Returns the number of keys written.
pub async fn upload_services<S: ConfigSink + ?Sized>(
    sink: &S,
    table: &RoutingTable,
) -> Result<usize, SinkError> {
    let mut services: Vec<_> = table.services().collect();
    services.sort();

    let mut written = 0;
    for service in services {
        if let Some(cohorts) = table.cohort_treatments(service.as_str()) {
            for (cohort, treatment) in cohorts {
                sink.put(&keys::treatment(service, cohort), treatment.as_str())
                    .await?;
                written += 1;
            }
        }

        if let Some(routes) = table.treatment_routes(service.as_str()) {
            for (treatment, route) in routes {
                let details = serde_json::to_string(route)?;
                sink.put(&keys::treatment_details(service, treatment), &details)
                    .await?;
                written += 1;
            }
        }
        tracing::debug!(service = %service, "Uploaded service");
    }

    tracing::info!(sink = sink.name(), keys = written, "Uploaded services and treatments");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohorts::{assign_cohorts, CohortStrategy};

    #[tokio::test]
    async fn test_upload_cohort_assignments() {
        let assignment = assign_cohorts(&["1-3", "101"], CohortStrategy::Mod100).unwrap();
        let sink = MemorySink::new();

        let written = upload_cohort_assignments(&sink, &assignment).await.unwrap();
        assert_eq!(written, 4);
        assert_eq!(sink.get("cohort-name:mod100:101").as_deref(), Some("mod100-cohort-01"));
        assert_eq!(sink.get("cohort-name:mod100:3").as_deref(), Some("mod100-cohort-03"));
    }

    #[tokio::test]
    async fn test_upload_services() {
        let table = RoutingTable::from_yaml(
            r#"
- service-name: svc-a
  service-cohorts:
    - cohort-name: "00"
      client-ids: [100]
  service-experiments:
    - treatments:
        - treatment-name: t1
          treatment-route: { target-pattern: "/route/{{ client_id }}", weight: 2 }
          assigned-cohorts: ["00"]
    - default-experiment: true
      treatments:
        - treatment-name: t0
          treatment-route: { target-pattern: "/default" }
          default-treatment: true
"#,
        )
        .unwrap();
        let sink = MemorySink::new();

        let written = upload_services(&sink, &table).await.unwrap();
        assert_eq!(written, 4);
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.get("treatment:svc-a:00").as_deref(), Some("t1"));

        let details: serde_json::Value =
            serde_json::from_str(&sink.get("treatment-details:svc-a:t1").unwrap()).unwrap();
        assert_eq!(details["target-pattern"], "/route/{{ client_id }}");
        assert_eq!(details["weight"], 2);

        assert_eq!(
            sink.get("treatment-details:svc-a:default"),
            sink.get("treatment-details:svc-a:t0")
        );
    }
}
