//! Metrics collection and exposition.
//!
//! # Metrics
//! - `xprtr_resolutions_total` (counter): resolutions by service, outcome
//! - `xprtr_resolution_duration_seconds` (histogram): handler latency
//! - `xprtr_routing_reloads_total` (counter): reloads by result
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Only services present in the active table get their own label; every
//!   other path segment is recorded as `unknown` to bound cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome label for a resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Treatment,
    Default,
    NotFound,
    BadRequest,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Treatment => "treatment",
            Outcome::Default => "default",
            Outcome::NotFound => "not_found",
            Outcome::BadRequest => "bad_request",
            Outcome::Error => "error",
        }
    }
}

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Label value for services that are not in the active table.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Record one resolution. `service` is `None` unless the name is a known
/// service of the active table.
pub fn record_resolution(service: Option<&str>, outcome: Outcome, start: Instant) {
    let service = service.unwrap_or(UNKNOWN_SERVICE).to_string();
    counter!(
        "xprtr_resolutions_total",
        "service" => service,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("xprtr_resolution_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_reload(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("xprtr_routing_reloads_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_services_share_one_series() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            for _ in 0..3 {
                record_resolution(None, Outcome::BadRequest, Instant::now());
            }
            record_resolution(Some("svc-a"), Outcome::Treatment, Instant::now());
            record_reload(false);
        });

        let rendered = handle.render();
        let series: Vec<&str> = rendered
            .lines()
            .filter(|l| l.starts_with("xprtr_resolutions_total{"))
            .collect();
        assert_eq!(series.len(), 2, "{}", rendered);
        assert!(series
            .iter()
            .any(|l| l.contains("service=\"unknown\"") && l.ends_with(" 3")));
        assert!(series.iter().any(|l| l.contains("service=\"svc-a\"")));
        assert!(rendered.contains("xprtr_routing_reloads_total{result=\"error\"} 1"));
    }
}
