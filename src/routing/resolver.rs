//! Treatment resolution.
//!
//! Pure lookups over an immutable [`RoutingTable`]: the same table, service
//! and client id always yield the same route.

use thiserror::Error;

use crate::routing::document::TreatmentRoute;
use crate::routing::ids::{ClientId, CohortName, ServiceName, TreatmentName, DEFAULT_TREATMENT};
use crate::routing::table::RoutingTable;

/// The table references something it does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("cohort '{cohort}' of service '{service}' has no treatment")]
    CohortWithoutTreatment { service: ServiceName, cohort: CohortName },

    #[error("treatment '{treatment}' of service '{service}' has no route")]
    TreatmentWithoutRoute { service: ServiceName, treatment: TreatmentName },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Service is not configured. An expected outcome, not a failure.
    #[error("service '{0}' not found")]
    NotFound(String),

    #[error("routing table inconsistent: {0}")]
    Consistency(#[from] ConsistencyError),
}

/// A resolved route and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub service: &'a ServiceName,
    /// Cohort of the client, `None` when the default route was served.
    pub cohort: Option<&'a CohortName>,
    pub treatment: &'a TreatmentName,
    pub route: &'a TreatmentRoute,
}

impl Resolution<'_> {
    pub fn is_default(&self) -> bool {
        self.cohort.is_none()
    }
}

impl RoutingTable {
    /// Resolve the route a client of `service` should receive.
    pub fn resolve(
        &self,
        service: &str,
        client_id: Option<ClientId>,
    ) -> Result<&TreatmentRoute, ResolveError> {
        self.resolve_treatment(service, client_id).map(|r| r.route)
    }

    /// Like [`resolve`](Self::resolve), also reporting cohort and treatment.
    pub fn resolve_treatment(
        &self,
        service: &str,
        client_id: Option<ClientId>,
    ) -> Result<Resolution<'_>, ResolveError> {
        let (service, routes) = self
            .treatment_route
            .get_key_value(service)
            .ok_or_else(|| ResolveError::NotFound(service.to_string()))?;

        let cohort = client_id.and_then(|id| {
            self.client_cohort
                .get(service)
                .and_then(|clients| clients.get(&id))
        });

        let Some(cohort) = cohort else {
            let (treatment, route) = routes.get_key_value(DEFAULT_TREATMENT).ok_or_else(|| {
                ConsistencyError::TreatmentWithoutRoute {
                    service: service.clone(),
                    treatment: TreatmentName::default_key(),
                }
            })?;
            return Ok(Resolution {
                service,
                cohort: None,
                treatment,
                route,
            });
        };

        let treatment = self
            .cohort_treatment
            .get(service)
            .and_then(|cohorts| cohorts.get(cohort))
            .ok_or_else(|| ConsistencyError::CohortWithoutTreatment {
                service: service.clone(),
                cohort: cohort.clone(),
            })?;

        let route = routes
            .get(treatment)
            .ok_or_else(|| ConsistencyError::TreatmentWithoutRoute {
                service: service.clone(),
                treatment: treatment.clone(),
            })?;

        Ok(Resolution {
            service,
            cohort: Some(cohort),
            treatment,
            route,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
- service-name: svc-a
  service-cohorts:
    - cohort-name: "00"
      client-ids: [100]
    - cohort-name: "01"
      client-ids: [101]
  service-experiments:
    - treatments:
        - treatment-name: t1
          treatment-route: { target-pattern: "/route/{{ client_id }}" }
          assigned-cohorts: ["00"]
    - default-experiment: true
      treatments:
        - treatment-name: t0
          treatment-route: { target-pattern: "/default" }
          default-treatment: true
"#;

    fn table() -> RoutingTable {
        RoutingTable::from_yaml(DOC).unwrap()
    }

    #[test]
    fn test_assigned_client() {
        let table = table();
        let r = table.resolve_treatment("svc-a", Some(ClientId(100))).unwrap();
        assert_eq!(r.route.target_pattern, "/route/{{ client_id }}");
        assert_eq!(r.treatment.as_str(), "t1");
        assert_eq!(r.cohort.map(CohortName::as_str), Some("00"));
        assert!(!r.is_default());
    }

    #[test]
    fn test_unassigned_client_gets_default() {
        let table = table();
        let unassigned = table.resolve("svc-a", Some(ClientId(999))).unwrap();
        let absent = table.resolve("svc-a", None).unwrap();
        assert_eq!(unassigned, absent);
        assert_eq!(absent.target_pattern, "/default");

        let r = table.resolve_treatment("svc-a", None).unwrap();
        assert!(r.is_default());
        assert_eq!(r.treatment.as_str(), "default");
    }

    #[test]
    fn test_unknown_service() {
        let table = table();
        for client in [None, Some(ClientId(1)), Some(ClientId(100))] {
            assert_eq!(
                table.resolve("svc-b", client),
                Err(ResolveError::NotFound("svc-b".to_string()))
            );
        }
    }

    #[test]
    fn test_cohort_without_treatment() {
        let table = table();
        assert_eq!(
            table.resolve("svc-a", Some(ClientId(101))),
            Err(ResolveError::Consistency(ConsistencyError::CohortWithoutTreatment {
                service: "svc-a".into(),
                cohort: "01".into(),
            }))
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let table = table();
        for _ in 0..10 {
            assert_eq!(
                table.resolve("svc-a", Some(ClientId(100))),
                table.resolve("svc-a", Some(ClientId(100)))
            );
        }
    }
}
