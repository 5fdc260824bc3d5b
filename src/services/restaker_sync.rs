use crate::error::{PipelineError, Result};
use crate::models::source_records::DelegationRecord;
use crate::models::{RestakerAggregate, RestakerStatus};
use crate::services::paged_fetch::fetch_pages;
use crate::services::pipeline::{decode_record, PipelineContext, SyncReport};
use crate::utils::helpers::{normalize_address, parse_unix_seconds, parse_wei};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::{info, warn};
use serde_json::Value;

pub const RESTAKERS_QUERY: &str = r#"
  query GetRestakers($first: Int!, $skip: Int!) {
    delegations(first: $first, skip: $skip, orderBy: id, where: { shares_gt: "0" }) {
      id
      delegator
      operator
      shares
      createdAtBlock
      createdAtTimestamp
    }
  }
"#;

/// Only delegations with positive shares are served, so every restaker seen
/// here is active.
pub fn to_restaker(record: DelegationRecord, now: DateTime<Utc>) -> Result<RestakerAggregate> {
    let user_address = normalize_address(&record.delegator)?;
    let amount = parse_wei(&user_address, &record.shares)?;

    Ok(RestakerAggregate {
        target_avs_operator_address: normalize_address(&record.operator)?,
        amount_restaked_steth: amount.to_ether_string(),
        restaking_timestamp: parse_unix_seconds(&user_address, &record.created_at_timestamp)?,
        status: RestakerStatus::Active,
        last_updated: now,
        user_address,
    })
}

async fn process_delegation(ctx: &PipelineContext, raw: Value) -> Result<()> {
    let record: DelegationRecord = decode_record("delegation", raw)?;
    let restaker = to_restaker(record, ctx.clock.now())?;
    ctx.store
        .upsert_restaker(&restaker)
        .await
        .map_err(|e| PipelineError::record(&restaker.user_address, e))
}

pub async fn sync_restakers(ctx: &PipelineContext) -> Result<SyncReport> {
    info!("Fetching restakers data...");
    let mut report = SyncReport::default();
    let mut pages = fetch_pages(
        ctx.source.as_ref(),
        ctx.paged_query(RESTAKERS_QUERY, "delegations"),
        ctx.settings.paging,
    );

    while let Some(page) = pages.next().await {
        for raw in page? {
            report.records_seen += 1;
            match process_delegation(ctx, raw).await {
                Ok(()) => report.persisted += 1,
                Err(e) => {
                    warn!("Error processing restaker: {}", e);
                    report.skipped += 1;
                }
            }
        }
    }

    info!("Restakers data updated successfully");
    Ok(report)
}
