use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::LogFormat;
use crate::error::{Error, Result};
use crate::types::RunId;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    installed.map_err(|e| Error::ConfigError(format!("tracing init failed: {}", e)))
}

pub fn trace_filter_run(candidates: usize) -> Span {
    tracing::info_span!(
        "filter_run",
        candidates,
    )
}

pub fn trace_aggregation_run(run_id: &RunId) -> Span {
    tracing::info_span!(
        "aggregation_run",
        run_id = %run_id,
    )
}
