//! Routing document schema.
//!
//! The document is a YAML sequence of services:
//!
//! ```yaml
//! - service-name: svc-a
//!   service-cohorts:
//!     - cohort-name: "00"
//!       client-ids: [100]
//!   service-experiments:
//!     - default-experiment: true
//!       treatments:
//!         - treatment-name: t0
//!           treatment-route: { target-pattern: "/default" }
//!           default-treatment: true
//! ```
//!
//! Unknown keys are rejected everywhere except inside `treatment-route`,
//! whose extra keys are carried through as opaque metadata.

use serde::{Deserialize, Serialize};

use crate::routing::ids::{ClientId, CohortName, ServiceName, TreatmentName};

/// One service entry of the routing document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServiceDocument {
    pub service_name: ServiceName,

    pub service_cohorts: Vec<CohortSpec>,

    pub service_experiments: Vec<ExperimentSpec>,
}

/// A named bucket of client ids.
///
/// Shared with the cohort generator output so a generated fragment can be
/// pasted into `service-cohorts` as is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CohortSpec {
    pub cohort_name: CohortName,

    pub client_ids: Vec<ClientId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExperimentSpec {
    /// Optional label, used only in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_name: Option<String>,

    /// Whether this experiment supplies the service's fallback treatment.
    #[serde(default)]
    pub default_experiment: bool,

    pub treatments: Vec<TreatmentSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TreatmentSpec {
    pub treatment_name: TreatmentName,

    pub treatment_route: TreatmentRoute,

    #[serde(default)]
    pub default_treatment: bool,

    #[serde(default)]
    pub assigned_cohorts: Vec<CohortName>,
}

/// Destination descriptor for a treatment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TreatmentRoute {
    /// URI template with `client_id` and `query_string` placeholders.
    #[serde(rename = "target-pattern")]
    pub target_pattern: String,

    /// Any other keys of the route mapping.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TreatmentRoute {
    pub fn new(target_pattern: impl Into<String>) -> Self {
        Self {
            target_pattern: target_pattern.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// Parse a routing document from YAML.
pub fn parse_services(content: &str) -> Result<Vec<ServiceDocument>, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
- service-name: svc-a
  service-cohorts:
    - cohort-name: "00"
      client-ids: [100, 200]
  service-experiments:
    - experiment-name: homepage
      treatments:
        - treatment-name: t1
          treatment-route:
            target-pattern: "/route/{{ client_id }}"
            owner: growth
          assigned-cohorts: ["00"]
    - default-experiment: true
      treatments:
        - treatment-name: t0
          treatment-route: { target-pattern: "/default" }
          default-treatment: true
"#;

    #[test]
    fn test_parse_document() {
        let services = parse_services(DOC).unwrap();
        assert_eq!(services.len(), 1);

        let svc = &services[0];
        assert_eq!(svc.service_name.as_str(), "svc-a");
        assert_eq!(svc.service_cohorts[0].client_ids, vec![ClientId(100), ClientId(200)]);

        let homepage = &svc.service_experiments[0];
        assert!(!homepage.default_experiment);
        assert_eq!(homepage.experiment_name.as_deref(), Some("homepage"));

        let t1 = &homepage.treatments[0];
        assert!(!t1.default_treatment);
        assert_eq!(t1.treatment_route.target_pattern, "/route/{{ client_id }}");
        assert_eq!(t1.treatment_route.metadata["owner"], "growth");

        let t0 = &svc.service_experiments[1].treatments[0];
        assert!(t0.default_treatment);
        assert!(t0.assigned_cohorts.is_empty());
    }

    #[test]
    fn test_missing_required_key() {
        let doc = r#"
- service-name: svc-a
  service-experiments: []
"#;
        let err = parse_services(doc).unwrap_err();
        assert!(err.to_string().contains("service-cohorts"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let doc = r#"
- service-name: svc-a
  service-cohorts: []
  service-experiments: []
  service-owner: me
"#;
        assert!(parse_services(doc).is_err());
    }

    #[test]
    fn test_negative_client_id_rejected() {
        let doc = r#"
- service-name: svc-a
  service-cohorts:
    - cohort-name: a
      client-ids: [-1]
  service-experiments: []
"#;
        assert!(parse_services(doc).is_err());
    }
}
