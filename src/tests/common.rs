use crate::error::{PipelineError, Result};
use crate::models::{RestakerAggregate, RewardAggregate, ValidatorAggregate};
use crate::repositories::AggregateStore;
use crate::services::paged_fetch::PageSettings;
use crate::services::pipeline::{Clock, PipelineContext, PipelineSettings};
use crate::services::subgraph::{PageVariables, SubgraphClient};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// Serves canned pages per query text, indexed by `skip / first`.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<String, Vec<Value>>,
    fail_after: HashMap<String, usize>,
    requests: Mutex<Vec<(String, PageVariables)>>,
    gate: Option<Arc<Semaphore>>,
    entered: Arc<Notify>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, query: &str, pages: Vec<Value>) -> Self {
        self.pages.insert(query.to_string(), pages);
        self
    }

    /// Answers the first `served` requests for `query`, then fails with a
    /// transport error.
    pub fn failing_after(mut self, query: &str, served: usize) -> Self {
        self.fail_after.insert(query.to_string(), served);
        self
    }

    /// Every request waits for a permit on `gate` before it is answered.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notified each time a request arrives.
    pub fn entered(&self) -> Arc<Notify> {
        self.entered.clone()
    }

    pub fn requested_offsets(&self, query: &str) -> Vec<usize> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, _)| q == query)
            .map(|(_, variables)| variables.skip)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SubgraphClient for ScriptedSource {
    async fn execute(
        &self,
        _endpoint: &str,
        query: &str,
        variables: PageVariables,
    ) -> Result<Value> {
        let served = {
            let mut requests = self.requests.lock().unwrap();
            let served = requests.iter().filter(|(q, _)| q == query).count();
            requests.push((query.to_string(), variables));
            served
        };
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }

        if matches!(self.fail_after.get(query), Some(limit) if served >= *limit) {
            return Err(PipelineError::Query("connection reset by scripted source".to_string()));
        }

        self.pages
            .get(query)
            .and_then(|pages| pages.get(variables.skip / variables.first.max(1)))
            .cloned()
            .ok_or_else(|| {
                PipelineError::Schema(format!("no scripted page at skip {}", variables.skip))
            })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    restakers: Mutex<BTreeMap<String, RestakerAggregate>>,
    validators: Mutex<BTreeMap<String, ValidatorAggregate>>,
    rewards: Mutex<BTreeMap<String, RewardAggregate>>,
    reward_writes: AtomicUsize,
    failing_rewards: HashSet<String>,
}

impl MemoryStore {
    pub fn failing_reward_for(mut self, wallet: &str) -> Self {
        self.failing_rewards.insert(wallet.to_string());
        self
    }

    pub fn restaker(&self, address: &str) -> Option<RestakerAggregate> {
        self.restakers.lock().unwrap().get(address).cloned()
    }

    pub fn restakers(&self) -> BTreeMap<String, RestakerAggregate> {
        self.restakers.lock().unwrap().clone()
    }

    pub fn restaker_count(&self) -> usize {
        self.restakers.lock().unwrap().len()
    }

    pub fn validator(&self, address: &str) -> Option<ValidatorAggregate> {
        self.validators.lock().unwrap().get(address).cloned()
    }

    pub fn validator_count(&self) -> usize {
        self.validators.lock().unwrap().len()
    }

    pub fn reward(&self, wallet: &str) -> Option<RewardAggregate> {
        self.rewards.lock().unwrap().get(wallet).cloned()
    }

    pub fn reward_count(&self) -> usize {
        self.rewards.lock().unwrap().len()
    }

    /// Successful reward upserts, counting replacements.
    pub fn reward_writes(&self) -> usize {
        self.reward_writes.load(Ordering::SeqCst)
    }
}

fn injected_failure() -> mongodb::error::Error {
    std::io::Error::new(std::io::ErrorKind::Other, "injected store failure").into()
}

#[async_trait]
impl AggregateStore for MemoryStore {
    async fn upsert_restaker(&self, restaker: &RestakerAggregate) -> mongodb::error::Result<()> {
        self.restakers
            .lock()
            .unwrap()
            .insert(restaker.user_address.clone(), restaker.clone());
        Ok(())
    }

    async fn upsert_validator(&self, validator: &ValidatorAggregate) -> mongodb::error::Result<()> {
        self.validators
            .lock()
            .unwrap()
            .insert(validator.operator_address.clone(), validator.clone());
        Ok(())
    }

    async fn upsert_reward(&self, reward: &RewardAggregate) -> mongodb::error::Result<()> {
        if self.failing_rewards.contains(&reward.wallet_address) {
            return Err(injected_failure());
        }
        self.rewards
            .lock()
            .unwrap()
            .insert(reward.wallet_address.clone(), reward.clone());
        self.reward_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_validator(
        &self,
        operator_address: &str,
    ) -> mongodb::error::Result<Option<ValidatorAggregate>> {
        Ok(self.validator(operator_address))
    }

    async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn test_context(
    source: impl Into<Arc<ScriptedSource>>,
    store: Arc<MemoryStore>,
    page_size: usize,
) -> PipelineContext {
    let source: Arc<ScriptedSource> = source.into();
    PipelineContext {
        source,
        store,
        clock: Arc::new(FixedClock(Utc.timestamp_opt(1_750_000_000, 0).unwrap())),
        settings: PipelineSettings {
            endpoint: "http://subgraph.test".to_string(),
            paging: PageSettings {
                page_size,
                page_delay: Duration::ZERO,
            },
            upsert_concurrency: 4,
        },
    }
}

pub fn items(count: usize) -> Vec<Value> {
    (0..count).map(|i| json!({ "id": i.to_string() })).collect()
}

pub fn delegation(delegator: &str, operator: &str, shares: &str, created_at: &str) -> Value {
    json!({
        "id": format!("{}-{}", delegator, operator),
        "delegator": delegator,
        "operator": operator,
        "shares": shares,
        "createdAtBlock": "19000000",
        "createdAtTimestamp": created_at,
    })
}

pub fn operator(
    address: &str,
    total_shares: &str,
    delegator_count: Value,
    is_active: bool,
    name: Option<&str>,
) -> Value {
    let metadata = name.map(|name| {
        json!({
            "name": name,
            "website": format!("https://{}.example", name.to_lowercase()),
            "description": "",
            "logo": null,
        })
    });
    json!({
        "id": address,
        "address": address,
        "totalShares": total_shares,
        "delegatorCount": delegator_count,
        "isActive": is_active,
        "createdAtBlock": "18000000",
        "createdAtTimestamp": "1690000000",
        "metadata": metadata,
    })
}

pub fn slashing(
    operator: &str,
    amount: &str,
    timestamp: &str,
    reason: Option<&str>,
    transaction_hash: &str,
) -> Value {
    json!({
        "id": transaction_hash,
        "operator": operator,
        "amount": amount,
        "timestamp": timestamp,
        "reason": reason,
        "transactionHash": transaction_hash,
    })
}

pub fn reward_claim(
    delegator: &str,
    operator: &str,
    amount: &str,
    timestamp: &str,
    transaction_hash: &str,
) -> Value {
    json!({
        "id": transaction_hash,
        "delegator": delegator,
        "operator": operator,
        "amount": amount,
        "timestamp": timestamp,
        "transactionHash": transaction_hash,
    })
}
