use crate::error::PipelineError;
use crate::models::Wei;
use chrono::{DateTime, TimeZone, Utc};

/// Lowercases an Ethereum address after checking it is `0x` + 40 hex digits.
pub fn normalize_address(address: &str) -> Result<String, PipelineError> {
    let trimmed = address.trim();
    let is_valid = trimmed.len() == 42
        && (trimmed.starts_with("0x") || trimmed.starts_with("0X"))
        && trimmed[2..].chars().all(|c| c.is_ascii_hexdigit());
    if !is_valid {
        return Err(PipelineError::record(address, "not a 20-byte hex address"));
    }
    Ok(format!("0x{}", trimmed[2..].to_ascii_lowercase()))
}

/// Converts a Unix-seconds string from the subgraph into an absolute date.
pub fn parse_unix_seconds(key: &str, value: &str) -> Result<DateTime<Utc>, PipelineError> {
    let secs: i64 = value
        .trim()
        .parse()
        .map_err(|_| PipelineError::record(key, format!("invalid timestamp {:?}", value)))?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| PipelineError::record(key, format!("timestamp {} out of range", secs)))
}

pub fn parse_wei(key: &str, value: &str) -> Result<Wei, PipelineError> {
    value.parse::<Wei>().map_err(|e| PipelineError::record(key, e))
}
