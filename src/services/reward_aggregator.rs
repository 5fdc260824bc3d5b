//! Folds reward claims into one document per wallet.
//!
//! Claims for the same wallet can be spread over any number of pages, so the
//! whole run is accumulated in memory first and every wallet is written
//! exactly once at the end. A run that fails mid-way writes nothing, which
//! keeps the previous run's totals intact instead of replacing them with a
//! partial sum.

use crate::error::{PipelineError, Result};
use crate::models::source_records::RewardClaimRecord;
use crate::models::{RewardAggregate, RewardBreakdown, Wei};
use crate::services::paged_fetch::fetch_pages;
use crate::services::pipeline::{decode_record, PipelineContext, SyncReport};
use crate::utils::helpers::{normalize_address, parse_unix_seconds, parse_wei};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

pub const REWARDS_QUERY: &str = r#"
  query GetRewards($first: Int!, $skip: Int!) {
    rewardClaims(first: $first, skip: $skip, orderBy: timestamp, orderDirection: desc) {
      id
      delegator
      operator
      amount
      timestamp
      transactionHash
    }
  }
"#;

/// A claim with its addresses, amount and time already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardClaim {
    pub wallet: String,
    pub operator: String,
    pub amount: Wei,
    pub timestamp: DateTime<Utc>,
    pub transaction_hash: String,
}

impl RewardClaim {
    pub fn from_raw(raw: Value) -> Result<Self> {
        let record: RewardClaimRecord = decode_record("reward claim", raw)?;
        let wallet = normalize_address(&record.delegator)?;
        Ok(Self {
            operator: normalize_address(&record.operator)?,
            amount: parse_wei(&record.transaction_hash, &record.amount)?,
            timestamp: parse_unix_seconds(&record.transaction_hash, &record.timestamp)?,
            transaction_hash: record.transaction_hash,
            wallet,
        })
    }
}

#[derive(Debug, Default)]
struct OperatorBucket {
    amount: Wei,
    timestamps: Vec<DateTime<Utc>>,
    transaction_hashes: Vec<String>,
}

#[derive(Debug, Default)]
struct WalletRewards {
    total: Wei,
    by_operator: BTreeMap<String, OperatorBucket>,
}

/// In-memory state of one run, keyed by wallet then operator.
#[derive(Debug, Default)]
pub struct RewardAccumulator {
    wallets: BTreeMap<String, WalletRewards>,
    claims: usize,
}

impl RewardAccumulator {
    pub fn add(&mut self, claim: RewardClaim) {
        let wallet = self.wallets.entry(claim.wallet).or_default();
        wallet.total += &claim.amount;

        let bucket = wallet.by_operator.entry(claim.operator).or_default();
        bucket.amount += &claim.amount;
        bucket.timestamps.push(claim.timestamp);
        bucket.transaction_hashes.push(claim.transaction_hash);
        self.claims += 1;
    }

    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }

    pub fn claim_count(&self) -> usize {
        self.claims
    }

    pub fn into_aggregates(self, now: DateTime<Utc>) -> Vec<RewardAggregate> {
        self.wallets
            .into_iter()
            .map(|(wallet_address, rewards)| {
                let breakdown = rewards
                    .by_operator
                    .into_iter()
                    .map(|(operator_address, bucket)| RewardBreakdown {
                        operator_address,
                        operator_name: String::new(),
                        amount_steth: bucket.amount.to_ether_string(),
                        timestamps: bucket.timestamps,
                        transaction_hashes: bucket.transaction_hashes,
                    })
                    .collect();
                RewardAggregate::new(
                    wallet_address,
                    rewards.total.to_ether_string(),
                    breakdown,
                    now,
                )
            })
            .collect()
    }
}

pub async fn sync_rewards(ctx: &PipelineContext) -> Result<SyncReport> {
    info!("Fetching rewards data...");
    let mut report = SyncReport::default();
    let mut accumulator = RewardAccumulator::default();
    let mut pages = fetch_pages(
        ctx.source.as_ref(),
        ctx.paged_query(REWARDS_QUERY, "rewardClaims"),
        ctx.settings.paging,
    );

    while let Some(page) = pages.next().await {
        for raw in page? {
            report.records_seen += 1;
            match RewardClaim::from_raw(raw) {
                Ok(claim) => accumulator.add(claim),
                Err(e) => {
                    warn!("Skipping reward claim: {}", e);
                    report.skipped += 1;
                }
            }
        }
    }

    info!(
        "Accumulated {} reward claim(s) for {} wallet(s)",
        accumulator.claim_count(),
        accumulator.wallet_count()
    );

    let store = ctx.store.as_ref();
    let results: Vec<Result<()>> = stream::iter(accumulator.into_aggregates(ctx.clock.now()))
        .map(|reward| async move {
            store
                .upsert_reward(&reward)
                .await
                .map_err(|e| PipelineError::record(reward.wallet_address.as_str(), e))
        })
        .buffer_unordered(ctx.settings.upsert_concurrency.max(1))
        .collect()
        .await;

    for result in results {
        match result {
            Ok(()) => report.persisted += 1,
            Err(e) => {
                warn!("Error processing rewards: {}", e);
                report.failed_writes += 1;
            }
        }
    }

    info!("Rewards data updated successfully");
    Ok(report)
}
