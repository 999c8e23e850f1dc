//! Key naming for uploaded configuration.
//!
//! | Key | Value |
//! |---|---|
//! | `cohort-name:<strategy>:<client-id>` | cohort name |
//! | `treatment:<service>:<cohort>` | treatment name |
//! | `treatment-details:<service>:<treatment>` | route as JSON |

use crate::routing::ids::{ClientId, CohortName, ServiceName, TreatmentName};

pub fn cohort_name(strategy: &str, client: ClientId) -> String {
    format!("cohort-name:{}:{}", strategy, client)
}

pub fn treatment(service: &ServiceName, cohort: &CohortName) -> String {
    format!("treatment:{}:{}", service, cohort)
}

pub fn treatment_details(service: &ServiceName, treatment: &TreatmentName) -> String {
    format!("treatment-details:{}:{}", service, treatment)
}
