use crate::error::{PipelineError, Result};
use crate::models::source_records::{OperatorRecord, SlashingRecord};
use crate::models::{SlashEvent, ValidatorAggregate, ValidatorMetadata, ValidatorStatus};
use crate::services::paged_fetch::fetch_pages;
use crate::services::pipeline::{decode_record, PipelineContext, SyncReport};
use crate::utils::helpers::{normalize_address, parse_unix_seconds, parse_wei};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub const OPERATORS_QUERY: &str = r#"
  query GetValidators($first: Int!, $skip: Int!) {
    operators(first: $first, skip: $skip, orderBy: totalShares, orderDirection: desc) {
      id
      address
      totalShares
      delegatorCount
      isActive
      createdAtBlock
      createdAtTimestamp
      metadata {
        name
        website
        description
        logo
      }
    }
  }
"#;

pub const SLASHINGS_QUERY: &str = r#"
  query GetSlashings($first: Int!, $skip: Int!) {
    slashings(first: $first, skip: $skip, orderBy: timestamp, orderDirection: desc) {
      id
      operator
      amount
      timestamp
      reason
      transactionHash
    }
  }
"#;

/// Slash events grouped by lowercase operator address, newest first.
pub type SlashIndex = HashMap<String, Vec<SlashEvent>>;

fn to_slash_event(record: SlashingRecord) -> Result<(String, SlashEvent)> {
    let operator = normalize_address(&record.operator)?;
    let amount = parse_wei(&record.transaction_hash, &record.amount)?;
    let event = SlashEvent {
        slash_id: record.id,
        timestamp: parse_unix_seconds(&record.transaction_hash, &record.timestamp)?,
        amount_steth: amount.to_ether_string(),
        reason: record
            .reason
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        transaction_hash: record.transaction_hash,
    };
    Ok((operator, event))
}

/// Pages through every slashing so no event is lost past the first page.
/// Offset paging can serve an event twice when new slashings land mid-scan,
/// so each slashing id is indexed once.
pub async fn fetch_slash_index(ctx: &PipelineContext) -> Result<SlashIndex> {
    let mut index = SlashIndex::new();
    let mut seen = HashSet::new();
    let mut pages = fetch_pages(
        ctx.source.as_ref(),
        ctx.paged_query(SLASHINGS_QUERY, "slashings"),
        ctx.settings.paging,
    );

    while let Some(page) = pages.next().await {
        for raw in page? {
            match decode_record("slashing", raw).and_then(to_slash_event) {
                Ok((operator, event)) => {
                    if seen.insert(event.slash_id.clone()) {
                        index.entry(operator).or_default().push(event);
                    } else {
                        debug!("Slashing {} already indexed", event.slash_id);
                    }
                }
                Err(e) => warn!("Skipping slashing record: {}", e),
            }
        }
    }

    Ok(index)
}

/// Unions stored and freshly observed history so entries survive runs that no
/// longer see them. Result is newest first.
pub fn merge_slash_history(stored: Vec<SlashEvent>, fresh: Vec<SlashEvent>) -> Vec<SlashEvent> {
    let retained: Vec<SlashEvent> = stored
        .into_iter()
        .filter(|old| !fresh.iter().any(|new| new.is_same_slash(old)))
        .collect();
    let mut merged = fresh;
    merged.extend(retained);
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}

pub fn to_validator(
    record: OperatorRecord,
    slash_history: Vec<SlashEvent>,
    now: DateTime<Utc>,
) -> Result<ValidatorAggregate> {
    let operator_address = normalize_address(&record.address)?;
    let stake = parse_wei(&operator_address, &record.total_shares)?;
    let metadata = record.metadata.unwrap_or_default();

    Ok(ValidatorAggregate {
        operator_name: metadata.name.unwrap_or_default(),
        total_delegated_stake_steth: stake.to_ether_string(),
        total_delegators: record
            .delegator_count
            .and_then(|count| count.trim().parse().ok())
            .unwrap_or(0),
        slash_history,
        status: ValidatorStatus::from_activity(record.is_active),
        registration_timestamp: parse_unix_seconds(
            &operator_address,
            &record.created_at_timestamp,
        )?,
        metadata: ValidatorMetadata {
            website: metadata.website.unwrap_or_default(),
            description: metadata.description.unwrap_or_default(),
            logo: metadata.logo.unwrap_or_default(),
        },
        last_updated: now,
        operator_address,
    })
}

async fn process_operator(
    ctx: &PipelineContext,
    raw: Value,
    slashes: &mut SlashIndex,
) -> Result<()> {
    let record: OperatorRecord = decode_record("operator", raw)?;
    let key = normalize_address(&record.address)?;
    let fresh = slashes.remove(&key).unwrap_or_default();

    let mut validator = to_validator(record, fresh, ctx.clock.now())?;
    let stored = ctx
        .store
        .find_validator(&validator.operator_address)
        .await
        .map_err(|e| PipelineError::record(&validator.operator_address, e))?;
    if let Some(stored) = stored {
        validator.slash_history =
            merge_slash_history(stored.slash_history, validator.slash_history);
    }

    if !validator.slash_history.is_empty() {
        match validator.total_slashed() {
            Ok(total) => debug!(
                "Operator {} has {} slash event(s) totalling {} stETH",
                validator.operator_address,
                validator.slash_history.len(),
                total.to_ether_string()
            ),
            Err(e) => warn!(
                "Unreadable slash amount for {}: {}",
                validator.operator_address, e
            ),
        }
    }

    ctx.store
        .upsert_validator(&validator)
        .await
        .map_err(|e| PipelineError::record(&validator.operator_address, e))
}

pub async fn sync_validators(ctx: &PipelineContext) -> Result<SyncReport> {
    info!("Fetching validators data...");
    let mut slashes = fetch_slash_index(ctx).await?;
    info!(
        "Indexed {} slash event(s) across {} operator(s)",
        slashes.values().map(Vec::len).sum::<usize>(),
        slashes.len()
    );

    let mut report = SyncReport::default();
    let mut pages = fetch_pages(
        ctx.source.as_ref(),
        ctx.paged_query(OPERATORS_QUERY, "operators"),
        ctx.settings.paging,
    );

    while let Some(page) = pages.next().await {
        for raw in page? {
            report.records_seen += 1;
            match process_operator(ctx, raw, &mut slashes).await {
                Ok(()) => report.persisted += 1,
                Err(e) => {
                    warn!("Error processing validator: {}", e);
                    report.skipped += 1;
                }
            }
        }
    }

    if !slashes.is_empty() {
        warn!(
            "{} operator(s) have slashings but were not listed as operators",
            slashes.len()
        );
    }
    info!("Validators data updated successfully");
    Ok(report)
}
