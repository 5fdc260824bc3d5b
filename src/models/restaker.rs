use super::datetime_utils::{deserialize_datetime, serialize_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestakerStatus {
    Active,
    Withdrawn,
    Slashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestakerAggregate {
    pub user_address: String,
    #[serde(rename = "amountRestakedStETH")]
    pub amount_restaked_steth: String,
    #[serde(rename = "targetAVSOperatorAddress")]
    pub target_avs_operator_address: String,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    pub restaking_timestamp: DateTime<Utc>,
    pub status: RestakerStatus,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    pub last_updated: DateTime<Utc>,
}
