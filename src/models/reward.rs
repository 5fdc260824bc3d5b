use super::datetime_utils::{self, deserialize_datetime, serialize_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardBreakdown {
    pub operator_address: String,
    #[serde(default)]
    pub operator_name: String,
    #[serde(rename = "amountStETH")]
    pub amount_steth: String,
    #[serde(with = "datetime_utils::vec")]
    pub timestamps: Vec<DateTime<Utc>>,
    pub transaction_hashes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardAggregate {
    pub wallet_address: String,
    #[serde(rename = "totalRewardsReceivedStETH")]
    pub total_rewards_received_steth: String,
    /// Ordered by operator address.
    pub rewards_breakdown: Vec<RewardBreakdown>,
    #[serde(with = "datetime_utils::option", default)]
    pub first_reward_timestamp: Option<DateTime<Utc>>,
    #[serde(with = "datetime_utils::option", default)]
    pub last_reward_timestamp: Option<DateTime<Utc>>,
    pub total_reward_events: i64,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    pub last_updated: DateTime<Utc>,
}

impl RewardAggregate {
    /// Builds the document for a wallet, deriving the event count and the
    /// first/last timestamps from the breakdown so they can never disagree.
    pub fn new(
        wallet_address: String,
        total_rewards_received_steth: String,
        rewards_breakdown: Vec<RewardBreakdown>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let all_timestamps = || rewards_breakdown.iter().flat_map(|b| b.timestamps.iter());
        let first_reward_timestamp = all_timestamps().min().copied();
        let last_reward_timestamp = all_timestamps().max().copied();
        let total_reward_events = all_timestamps().count() as i64;

        Self {
            wallet_address,
            total_rewards_received_steth,
            rewards_breakdown,
            first_reward_timestamp,
            last_reward_timestamp,
            total_reward_events,
            last_updated,
        }
    }
}
