use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn, Instrument};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::AGGREGATION_LATENCY;
use crate::observability::tracing::trace_aggregation_run;
use crate::price_infra::connectors::SourceRegistry;
use crate::price_infra::observer::{NoopObserver, ProgressObserver};
use crate::price_infra::{Diagnostics, PriceAggregator, SourceFilter};
use crate::types::{Price, RunId};

/// Outcome of one filter and aggregation cycle.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub prices: Vec<Price>,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::SerializationError(e.to_string()))
    }
}

/// Runs the price pipeline once or on a fixed interval.
///
/// Each cycle re-filters the candidate sources and aggregates from scratch;
/// nothing carries over between cycles.
pub struct Updater {
    config: AppConfig,
    registry: Arc<SourceRegistry>,
    observer: Arc<dyn ProgressObserver>,
}

impl Updater {
    pub fn new(config: AppConfig, registry: Arc<SourceRegistry>) -> Result<Self> {
        config.validate()?;
        Ok(Updater {
            config,
            registry,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn run_once(&self) -> Result<RunReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let clock = Instant::now();
        let _timer = AGGREGATION_LATENCY.start_timer();

        let weights = self.config.weights()?;
        let rates = self.config.reference_rates();
        let currencies = &self.config.updater.currencies;
        let denom = self.config.updater.denom.as_str();

        let outcome = async {
            let filter = SourceFilter::new(self.registry.clone(), denom)
                .with_blacklist(self.config.exchange.blacklist.iter().cloned())
                .with_listing_timeout(self.config.fetch.listing_timeout())
                .with_max_concurrency(self.config.fetch.max_concurrency)
                .with_observer(self.observer.clone());
            let candidates = self.config.candidates(&self.registry);
            let filtered = filter.filter(&candidates, currencies).await;

            let aggregator = PriceAggregator::new(denom, weights)
                .with_fetch_timeout(self.config.fetch.timeout())
                .with_max_concurrency(self.config.fetch.max_concurrency)
                .with_observer(self.observer.clone());
            let mut outcome = aggregator.aggregate(&filtered.capabilities, &rates, currencies).await;
            outcome.diagnostics.listing_faults = filtered.listing_faults;
            outcome
        }
        .instrument(trace_aggregation_run(&run_id))
        .await;

        let report = RunReport {
            run_id,
            started_at,
            elapsed_ms: clock.elapsed().as_millis() as u64,
            prices: outcome.prices,
            diagnostics: outcome.diagnostics,
        };

        info!(
            run_id = %report.run_id,
            prices = report.prices.len(),
            elapsed_ms = report.elapsed_ms,
            "Aggregation cycle finished"
        );
        Ok(report)
    }

    /// Sends one report per cycle until `shutdown` flips or the receiver goes away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>, reports: mpsc::Sender<RunReport>) -> Result<()> {
        let Some(period) = self.config.updater.interval() else {
            info!("Updater run as one-time mode");
            let report = self.run_once().await?;
            reports.send(report).await
                .map_err(|_| Error::TaskError("report receiver dropped".to_string()))?;
            return Ok(());
        };

        info!(interval = ?period, "Updater run as periodic mode");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Updater is shutting down");
                        return Ok(());
                    }
                }
                _ = ticker.tick() => {
                    let report = match self.run_once().await {
                        Ok(report) => report,
                        Err(e) => {
                            warn!("Aggregation cycle failed: {}", e);
                            continue;
                        }
                    };
                    if reports.send(report).await.is_err() {
                        warn!("Report receiver dropped; stopping updater");
                        return Ok(());
                    }
                }
            }
        }
    }
}
