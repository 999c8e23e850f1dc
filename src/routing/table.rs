//! Routing table construction.
//!
//! # Responsibilities
//! - Flatten each service's cohorts into a client → cohort map
//! - Record treatment routes and cohort → treatment assignments
//! - Register the default experiment's default treatment under `default`
//! - Reject inconsistent documents before any table is published
//!
//! # Design Decisions
//! - All problems are collected, not just the first
//! - A client listed in two cohorts of one service is an error
//! - Target patterns are checked against the renderer at build time

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::routing::document::{parse_services, ServiceDocument, TreatmentRoute};
use crate::routing::ids::{ClientId, CohortName, ServiceName, TreatmentName};
use crate::routing::render::RouteRenderer;

/// A semantic problem found while building the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingIssue {
    #[error("empty {kind} name in service '{service}'")]
    EmptyName { kind: &'static str, service: ServiceName },

    #[error("duplicate service '{0}'")]
    DuplicateService(ServiceName),

    #[error("duplicate cohort '{cohort}' in service '{service}'")]
    DuplicateCohort { service: ServiceName, cohort: CohortName },

    #[error("client {client} of service '{service}' is in cohorts '{first}' and '{second}'")]
    DuplicateClient {
        service: ServiceName,
        client: ClientId,
        first: CohortName,
        second: CohortName,
    },

    #[error("duplicate treatment '{treatment}' in service '{service}'")]
    DuplicateTreatment { service: ServiceName, treatment: TreatmentName },

    #[error("treatment name 'default' is reserved (service '{0}')")]
    ReservedTreatmentName(ServiceName),

    #[error("treatment '{treatment}' of service '{service}' assigns undefined cohort '{cohort}'")]
    UndefinedCohort {
        service: ServiceName,
        treatment: TreatmentName,
        cohort: CohortName,
    },

    #[error("cohort '{cohort}' of service '{service}' is assigned to '{first}' and '{second}'")]
    CohortAssignedTwice {
        service: ServiceName,
        cohort: CohortName,
        first: TreatmentName,
        second: TreatmentName,
    },

    #[error("service '{0}' has no default treatment")]
    MissingDefault(ServiceName),

    #[error("service '{service}' has more than one default treatment: {}", join(.treatments))]
    MultipleDefaults {
        service: ServiceName,
        treatments: Vec<TreatmentName>,
    },

    #[error("treatment '{treatment}' of service '{service}' has an invalid target pattern: {reason}")]
    InvalidPattern {
        service: ServiceName,
        treatment: TreatmentName,
        reason: String,
    },
}

fn join(names: &[TreatmentName]) -> String {
    names
        .iter()
        .map(TreatmentName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable routing tables for all services.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    pub(crate) client_cohort: HashMap<ServiceName, HashMap<ClientId, CohortName>>,
    pub(crate) cohort_treatment: HashMap<ServiceName, HashMap<CohortName, TreatmentName>>,
    pub(crate) treatment_route: HashMap<ServiceName, HashMap<TreatmentName, TreatmentRoute>>,
}

#[derive(Default)]
struct ServiceTables {
    clients: HashMap<ClientId, CohortName>,
    cohorts: HashMap<CohortName, TreatmentName>,
    routes: HashMap<TreatmentName, TreatmentRoute>,
}

impl RoutingTable {
    /// Parse and build from a YAML routing document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let services = parse_services(content)?;
        Self::from_services(&services)
    }

    /// Build from parsed service documents.
    pub fn from_services(services: &[ServiceDocument]) -> Result<Self, ConfigError> {
        let renderer = RouteRenderer::new();
        let mut issues = Vec::new();
        let mut table = RoutingTable::default();

        for svc in services {
            let service = &svc.service_name;
            if service.is_empty() {
                issues.push(RoutingIssue::EmptyName {
                    kind: "service",
                    service: service.clone(),
                });
                continue;
            }
            if table.treatment_route.contains_key(service) {
                issues.push(RoutingIssue::DuplicateService(service.clone()));
                continue;
            }

            let tables = build_service(svc, &renderer, &mut issues);
            table.client_cohort.insert(service.clone(), tables.clients);
            table.cohort_treatment.insert(service.clone(), tables.cohorts);
            table.treatment_route.insert(service.clone(), tables.routes);
        }

        if !issues.is_empty() {
            return Err(ConfigError::Routing(issues));
        }

        for service in table.treatment_route.keys() {
            tracing::debug!(
                service = %service,
                clients = table.client_cohort[service].len(),
                cohorts = table.cohort_treatment[service].len(),
                treatments = table.treatment_route[service].len() - 1,
                "Service routing loaded"
            );
        }
        tracing::info!(services = table.treatment_route.len(), "Routing table built");

        Ok(table)
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceName> {
        self.treatment_route.keys()
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.treatment_route.contains_key(service)
    }

    pub fn client_cohorts(&self, service: &str) -> Option<&HashMap<ClientId, CohortName>> {
        self.client_cohort.get(service)
    }

    pub fn cohort_treatments(&self, service: &str) -> Option<&HashMap<CohortName, TreatmentName>> {
        self.cohort_treatment.get(service)
    }

    /// Routes of a service, including the synthesized `default` entry.
    pub fn treatment_routes(&self, service: &str) -> Option<&HashMap<TreatmentName, TreatmentRoute>> {
        self.treatment_route.get(service)
    }
}

fn build_service(
    svc: &ServiceDocument,
    renderer: &RouteRenderer,
    issues: &mut Vec<RoutingIssue>,
) -> ServiceTables {
    let service = &svc.service_name;
    let mut tables = ServiceTables::default();
    let mut defined = HashSet::new();

    for cohort in &svc.service_cohorts {
        if cohort.cohort_name.is_empty() {
            issues.push(RoutingIssue::EmptyName {
                kind: "cohort",
                service: service.clone(),
            });
        }
        if !defined.insert(cohort.cohort_name.clone()) {
            issues.push(RoutingIssue::DuplicateCohort {
                service: service.clone(),
                cohort: cohort.cohort_name.clone(),
            });
        }
        for &client in &cohort.client_ids {
            if let Some(first) = tables.clients.insert(client, cohort.cohort_name.clone()) {
                if first != cohort.cohort_name {
                    issues.push(RoutingIssue::DuplicateClient {
                        service: service.clone(),
                        client,
                        first,
                        second: cohort.cohort_name.clone(),
                    });
                }
            }
        }
    }

    let mut defaults = Vec::new();
    for experiment in &svc.service_experiments {
        for treatment in &experiment.treatments {
            let name = &treatment.treatment_name;
            if name.is_empty() {
                issues.push(RoutingIssue::EmptyName {
                    kind: "treatment",
                    service: service.clone(),
                });
            } else if name.is_default_key() {
                issues.push(RoutingIssue::ReservedTreatmentName(service.clone()));
            }

            if let Err(e) = renderer.check(&treatment.treatment_route.target_pattern) {
                issues.push(RoutingIssue::InvalidPattern {
                    service: service.clone(),
                    treatment: name.clone(),
                    reason: e.to_string(),
                });
            }

            if tables
                .routes
                .insert(name.clone(), treatment.treatment_route.clone())
                .is_some()
            {
                issues.push(RoutingIssue::DuplicateTreatment {
                    service: service.clone(),
                    treatment: name.clone(),
                });
            }

            for cohort in &treatment.assigned_cohorts {
                if !defined.contains(cohort) {
                    issues.push(RoutingIssue::UndefinedCohort {
                        service: service.clone(),
                        treatment: name.clone(),
                        cohort: cohort.clone(),
                    });
                }
                if let Some(first) = tables.cohorts.insert(cohort.clone(), name.clone()) {
                    if &first != name {
                        issues.push(RoutingIssue::CohortAssignedTwice {
                            service: service.clone(),
                            cohort: cohort.clone(),
                            first,
                            second: name.clone(),
                        });
                    }
                }
            }

            if treatment.default_treatment {
                if experiment.default_experiment {
                    defaults.push(treatment);
                } else {
                    tracing::warn!(
                        service = %service,
                        treatment = %name,
                        "default-treatment set outside the default experiment; ignored"
                    );
                }
            }
        }
    }

    match defaults.as_slice() {
        [] => issues.push(RoutingIssue::MissingDefault(service.clone())),
        [default] => {
            tables
                .routes
                .insert(TreatmentName::default_key(), default.treatment_route.clone());
        }
        many => issues.push(RoutingIssue::MultipleDefaults {
            service: service.clone(),
            treatments: many.iter().map(|t| t.treatment_name.clone()).collect(),
        }),
    }

    for cohort in &svc.service_cohorts {
        if !cohort.client_ids.is_empty() && !tables.cohorts.contains_key(&cohort.cohort_name) {
            tracing::warn!(
                service = %service,
                cohort = %cohort.cohort_name,
                clients = cohort.client_ids.len(),
                "Cohort has clients but no treatment"
            );
        }
    }

    tables
}
