//! Raw entities as served by the EigenLayer subgraph.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The Graph serializes `BigInt` as strings, but some deployments emit plain
/// numbers for counters and timestamps.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRecord {
    pub delegator: String,
    pub operator: String,
    #[serde(deserialize_with = "string_or_number")]
    pub shares: String,
    #[serde(deserialize_with = "string_or_number")]
    pub created_at_timestamp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatorMetadataRecord {
    pub name: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorRecord {
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_shares: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub delegator_count: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub created_at_timestamp: String,
    #[serde(default)]
    pub metadata: Option<OperatorMetadataRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashingRecord {
    pub id: String,
    pub operator: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardClaimRecord {
    pub delegator: String,
    pub operator: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    pub transaction_hash: String,
}
