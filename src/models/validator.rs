use super::amount::{AmountError, Wei};
use super::datetime_utils::{deserialize_datetime, serialize_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    Active,
    Inactive,
    Jailed,
    Slashed,
}

impl ValidatorStatus {
    pub fn from_activity(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashEvent {
    /// Subgraph entity id. Empty on documents written before it was recorded.
    #[serde(default)]
    pub slash_id: String,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "amountStETH")]
    pub amount_steth: String,
    pub reason: String,
    pub transaction_hash: String,
}

impl SlashEvent {
    /// Whether both entries record the same on-chain slash. Compares entity ids
    /// when both carry one, falling back to hash, time and amount otherwise.
    pub fn is_same_slash(&self, other: &SlashEvent) -> bool {
        if !self.slash_id.is_empty() && !other.slash_id.is_empty() {
            return self.slash_id == other.slash_id;
        }
        self.transaction_hash == other.transaction_hash
            && self.timestamp == other.timestamp
            && self.amount_steth == other.amount_steth
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorMetadata {
    pub website: String,
    pub description: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorAggregate {
    pub operator_address: String,
    pub operator_name: String,
    #[serde(rename = "totalDelegatedStakeStETH")]
    pub total_delegated_stake_steth: String,
    pub total_delegators: i64,
    /// Newest first.
    pub slash_history: Vec<SlashEvent>,
    pub status: ValidatorStatus,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    pub registration_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ValidatorMetadata,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    pub last_updated: DateTime<Utc>,
}

impl ValidatorAggregate {
    pub fn total_slashed(&self) -> Result<Wei, AmountError> {
        self.slash_history
            .iter()
            .map(|slash| Wei::from_ether_str(&slash.amount_steth))
            .sum()
    }
}
