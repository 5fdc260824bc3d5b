use thiserror::Error;

/// Errors raised while fetching, normalizing or persisting restaking data.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Transport failure, timeout or non-success status from the subgraph.
    #[error("Subgraph query error: {0}")]
    Query(String),

    /// The subgraph answered, but with an error payload or a malformed envelope.
    #[error("Subgraph schema error: {0}")]
    Schema(String),

    /// A single record could not be normalized or persisted.
    #[error("Record processing error for {key}: {reason}")]
    Record { key: String, reason: String },
}

impl PipelineError {
    pub fn record(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Record {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Query(format!("request timed out: {}", err))
        } else {
            Self::Query(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
