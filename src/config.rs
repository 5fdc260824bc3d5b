use crate::error::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SUBGRAPH_URL: &str =
    "https://api.thegraph.com/subgraphs/name/eigenlayer/eigenlayer";

pub struct Config {
    pub mongo_uri: String,
    pub db_name: String,
    pub subgraph_url: String,
    pub page_size: usize,
    pub page_delay: Duration,
    pub request_timeout: Duration,
    pub sync_interval: Duration,
    pub startup_delay: Duration,
    pub upsert_concurrency: usize,
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            mongo_uri: env::var("MONGO_URI").map_err(|_| ConfigError::Missing("MONGO_URI"))?,
            db_name: env::var("DB_NAME").map_err(|_| ConfigError::Missing("DB_NAME"))?,
            subgraph_url: env::var("SUBGRAPH_URL")
                .unwrap_or_else(|_| DEFAULT_SUBGRAPH_URL.to_string()),
            page_size: parse_nonzero("PAGE_SIZE", 1000)?,
            page_delay: Duration::from_millis(parse_var("PAGE_DELAY_MS", 100)?),
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30)?),
            sync_interval: Duration::from_secs(parse_nonzero("SYNC_INTERVAL_SECS", 6 * 60 * 60)?),
            startup_delay: Duration::from_secs(parse_var("STARTUP_DELAY_SECS", 5)?),
            upsert_concurrency: parse_var("UPSERT_CONCURRENCY", 16)?,
            run_once: parse_var("RUN_ONCE", false)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_var`], but zero is rejected. A zero period cannot drive a ticker.
fn parse_nonzero<T: FromStr + Default + PartialEq>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let value = parse_var(name, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        });
    }
    Ok(value)
}
