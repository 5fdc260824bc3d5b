use crate::models::{RestakerStatus, ValidatorStatus, Wei};
use crate::services::restaker_sync::RESTAKERS_QUERY;
use crate::services::reward_aggregator::REWARDS_QUERY;
use crate::services::scheduler::{RunOutcome, ScheduleSettings, Scheduler};
use crate::services::validator_sync::{OPERATORS_QUERY, SLASHINGS_QUERY};
use crate::tests::common::{
    delegation, operator, reward_claim, slashing, test_context, MemoryStore, ScriptedSource,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const DELEGATOR: &str = "0xAAA0000000000000000000000000000000000001";
const OPERATOR: &str = "0xBBB0000000000000000000000000000000000001";

fn schedule() -> ScheduleSettings {
    ScheduleSettings {
        startup_delay: Duration::from_secs(5),
        interval: Duration::from_secs(6 * 60 * 60),
    }
}

/// Same wallet/operator pair on every page; delegations for one delegator on
/// two pages. Restakers must keep the last page, rewards must sum them all.
fn two_page_source() -> ScriptedSource {
    ScriptedSource::new()
        .with_pages(
            RESTAKERS_QUERY,
            vec![
                json!({ "delegations": [delegation(DELEGATOR, OPERATOR, "1000000000000000000", "1700000000")] }),
                json!({ "delegations": [delegation(DELEGATOR, OPERATOR, "2000000000000000000", "1700000100")] }),
                json!({ "delegations": [] }),
            ],
        )
        .with_pages(
            SLASHINGS_QUERY,
            vec![
                json!({ "slashings": [slashing(OPERATOR, "100000000000000000", "1700000500", Some("downtime"), "0xs1")] }),
                json!({ "slashings": [] }),
            ],
        )
        .with_pages(
            OPERATORS_QUERY,
            vec![
                json!({ "operators": [operator(OPERATOR, "3000000000000000000", json!("1"), true, Some("Bravo"))] }),
                json!({ "operators": [] }),
            ],
        )
        .with_pages(
            REWARDS_QUERY,
            vec![
                json!({ "rewardClaims": [reward_claim(DELEGATOR, OPERATOR, "1000000000000000000", "1700000300", "0xr2")] }),
                json!({ "rewardClaims": [reward_claim(DELEGATOR, OPERATOR, "2000000000000000000", "1700000200", "0xr1")] }),
                json!({ "rewardClaims": [] }),
            ],
        )
}

#[tokio::test]
async fn restakers_replace_while_rewards_accumulate() {
    let store = Arc::new(MemoryStore::default());
    let scheduler = Scheduler::new(test_context(two_page_source(), store.clone(), 1), schedule());

    let RunOutcome::Completed(report) = scheduler.fetch_all().await else {
        panic!("idle scheduler skipped a run");
    };
    assert_eq!(report.failed_syncs(), 0);

    assert_eq!(store.restaker_count(), 1);
    let restaker = store.restaker("0xaaa0000000000000000000000000000000000001").unwrap();
    assert_eq!(restaker.amount_restaked_steth, "2");
    assert_eq!(restaker.status, RestakerStatus::Active);

    let reward = store.reward("0xaaa0000000000000000000000000000000000001").unwrap();
    assert_eq!(reward.total_rewards_received_steth, "3");
    assert_eq!(reward.rewards_breakdown[0].amount_steth, "3");
    assert_eq!(reward.total_reward_events, 2);

    let validator = store.validator("0xbbb0000000000000000000000000000000000001").unwrap();
    assert_eq!(validator.status, ValidatorStatus::Active);
    assert_eq!(validator.total_delegated_stake_steth, "3");
    assert_eq!(validator.slash_history.len(), 1);
    assert!(!scheduler.is_running());
}

fn address(prefix: char, n: usize) -> String {
    format!("0x{}{:039x}", prefix, n)
}

#[tokio::test]
async fn reward_invariants_hold_over_many_pages() {
    let claims: Vec<Value> = (0..37)
        .map(|i| {
            reward_claim(
                &address('c', i % 5),
                &address('a', i % 3),
                &format!("{}", 1_000_000_000_000_000u64 * (i as u64 + 1)),
                &format!("{}", 1_700_000_000 + (i * 7919) % 1000),
                &format!("0x{:064x}", i),
            )
        })
        .collect();
    let mut pages: Vec<Value> = claims
        .chunks(4)
        .map(|chunk| json!({ "rewardClaims": chunk }))
        .collect();
    pages.push(json!({ "rewardClaims": [] }));

    let source = ScriptedSource::new()
        .with_pages(RESTAKERS_QUERY, vec![json!({ "delegations": [] })])
        .with_pages(SLASHINGS_QUERY, vec![json!({ "slashings": [] })])
        .with_pages(OPERATORS_QUERY, vec![json!({ "operators": [] })])
        .with_pages(REWARDS_QUERY, pages);
    let store = Arc::new(MemoryStore::default());
    let scheduler = Scheduler::new(test_context(source, store.clone(), 4), schedule());

    scheduler.fetch_all().await;

    assert_eq!(store.reward_count(), 5);
    let mut events = 0;
    let mut grand_total = Wei::zero();
    for wallet in 0..5 {
        let reward = store.reward(&address('c', wallet)).unwrap();
        let timestamps: Vec<_> = reward
            .rewards_breakdown
            .iter()
            .flat_map(|b| b.timestamps.iter().copied())
            .collect();

        assert_eq!(reward.total_reward_events as usize, timestamps.len());
        assert_eq!(reward.first_reward_timestamp, timestamps.iter().min().copied());
        assert_eq!(reward.last_reward_timestamp, timestamps.iter().max().copied());
        for breakdown in &reward.rewards_breakdown {
            assert_eq!(breakdown.timestamps.len(), breakdown.transaction_hashes.len());
        }

        events += timestamps.len();
        grand_total += &Wei::from_ether_str(&reward.total_rewards_received_steth).unwrap();
    }

    assert_eq!(events, 37);
    // Sum of 0.001 * (1..=37) ether.
    assert_eq!(grand_total.to_ether_string(), "0.703");
}
