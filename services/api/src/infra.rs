use hireboard::pipeline::PipelinePolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Process-level state for the operational endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_policy(raw: &str) -> Result<PipelinePolicy, String> {
    raw.parse::<PipelinePolicy>().map_err(|err| err.to_string())
}
