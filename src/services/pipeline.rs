use crate::error::{PipelineError, Result};
use crate::repositories::AggregateStore;
use crate::services::paged_fetch::{PageSettings, PagedQuery};
use crate::services::subgraph::SubgraphClient;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub endpoint: String,
    pub paging: PageSettings,
    /// Maximum number of reward upserts in flight at the end of a run.
    pub upsert_concurrency: usize,
}

/// Everything a sync needs for one run. Cheap to clone.
#[derive(Clone)]
pub struct PipelineContext {
    pub source: Arc<dyn SubgraphClient>,
    pub store: Arc<dyn AggregateStore>,
    pub clock: Arc<dyn Clock>,
    pub settings: PipelineSettings,
}

impl PipelineContext {
    pub fn paged_query<'a>(&'a self, query: &'a str, field: &'a str) -> PagedQuery<'a> {
        PagedQuery {
            endpoint: &self.settings.endpoint,
            query,
            field,
        }
    }
}

/// Counters for one sync. `records_seen` and `skipped` count source records;
/// `persisted` and `failed_writes` count documents, which for rewards are
/// wallets rather than claims. Restaker and validator documents map one to one
/// onto records, so their failed writes are counted as skipped records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub records_seen: usize,
    pub skipped: usize,
    pub persisted: usize,
    pub failed_writes: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub restakers: Result<SyncReport>,
    pub validators: Result<SyncReport>,
    pub rewards: Result<SyncReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn failed_syncs(&self) -> usize {
        [&self.restakers, &self.validators, &self.rewards]
            .iter()
            .filter(|result| result.is_err())
            .count()
    }

    pub fn log(&self) {
        for (name, result) in [
            ("restakers", &self.restakers),
            ("validators", &self.validators),
            ("rewards", &self.rewards),
        ] {
            match result {
                Ok(report) => info!(
                    "{} sync finished: {} seen, {} skipped, {} persisted, {} failed write(s)",
                    name,
                    report.records_seen,
                    report.skipped,
                    report.persisted,
                    report.failed_writes
                ),
                Err(e) => error!("{} sync failed: {}", name, e),
            }
        }
        info!(
            "Data fetch run completed in {:.1}s with {} failed sync(s)",
            self.elapsed.as_secs_f64(),
            self.failed_syncs()
        );
    }
}

/// Decodes one raw record; a malformed record becomes a record error keyed
/// by its subgraph id when it has one.
pub fn decode_record<T: DeserializeOwned>(kind: &str, raw: Value) -> Result<T> {
    let key = raw
        .get("id")
        .and_then(Value::as_str)
        .map(|id| format!("{} {}", kind, id))
        .unwrap_or_else(|| kind.to_string());
    serde_json::from_value(raw).map_err(|e| PipelineError::record(key, e))
}
