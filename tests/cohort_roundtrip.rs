//! Generated cohorts feed a routing document.

use xp_router::cohorts::{assign_cohorts, CohortAssignment, CohortStrategy};
use xp_router::routing::document::{
    ExperimentSpec, ServiceDocument, TreatmentRoute, TreatmentSpec,
};
use xp_router::routing::{ClientId, RoutingTable, TreatmentName};
use xp_router::upload::{upload_cohort_assignments, upload_services, MemorySink};

mod common;

fn service_with(assignment: &CohortAssignment) -> ServiceDocument {
    ServiceDocument {
        service_name: "svc-gen".into(),
        service_cohorts: assignment.cohorts.clone(),
        service_experiments: vec![
            ExperimentSpec {
                experiment_name: Some("all-in".into()),
                default_experiment: false,
                treatments: vec![TreatmentSpec {
                    treatment_name: "on".into(),
                    treatment_route: TreatmentRoute::new("/on/{{ client_id }}"),
                    default_treatment: false,
                    assigned_cohorts: assignment
                        .cohorts
                        .iter()
                        .map(|c| c.cohort_name.clone())
                        .collect(),
                }],
            },
            ExperimentSpec {
                experiment_name: None,
                default_experiment: true,
                treatments: vec![TreatmentSpec {
                    treatment_name: "off".into(),
                    treatment_route: TreatmentRoute::new("/off"),
                    default_treatment: true,
                    assigned_cohorts: Vec::new(),
                }],
            },
        ],
    }
}

#[test]
fn test_generated_cohorts_resolve_to_their_treatment() {
    let assignment = assign_cohorts(&["1-250", "1000"], CohortStrategy::Mod100).unwrap();
    let yaml = assignment.to_yaml().unwrap();
    let parsed = CohortAssignment::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, assignment);

    let table = RoutingTable::from_services(&[service_with(&parsed)]).unwrap();
    let cohorts = table.client_cohorts("svc-gen").unwrap();
    assert_eq!(cohorts.len(), 251);

    for cohort in &parsed.cohorts {
        for id in &cohort.client_ids {
            assert_eq!(cohorts[id], cohort.cohort_name);
            let resolution = table.resolve_treatment("svc-gen", Some(*id)).unwrap();
            assert_eq!(resolution.treatment, &TreatmentName::from("on"));
        }
    }

    let resolution = table.resolve_treatment("svc-gen", Some(ClientId(5000))).unwrap();
    assert!(resolution.is_default());
}

#[tokio::test]
async fn test_generated_cohorts_upload() {
    let assignment = assign_cohorts(&["7", "107", "8"], CohortStrategy::Mod100).unwrap();
    let sink = MemorySink::new();

    let written = upload_cohort_assignments(&sink, &assignment).await.unwrap();
    assert_eq!(written, 3);
    assert_eq!(
        sink.get("cohort-name:mod100:107").as_deref(),
        Some("mod100-cohort-07")
    );

    let table = RoutingTable::from_services(&[service_with(&assignment)]).unwrap();
    upload_services(&sink, &table).await.unwrap();
    assert_eq!(
        sink.get("treatment:svc-gen:mod100-cohort-08").as_deref(),
        Some("on")
    );
    assert!(sink.get("treatment-details:svc-gen:default").is_some());
}

#[tokio::test]
async fn test_generated_service_served_over_http() {
    let assignment = assign_cohorts(&["40-42"], CohortStrategy::Random { seed: 7 }).unwrap();
    let document = serde_yaml::to_string(&vec![service_with(&assignment)]).unwrap();

    let router = common::start_router(&document).await;
    let body: xp_router::http::server::ResolvedRoute =
        reqwest::get(router.url("/services/svc-gen?client-id=41"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(body.treatment, "on");
    assert_eq!(body.target, "/on/41");
    router.shutdown.trigger();
}
