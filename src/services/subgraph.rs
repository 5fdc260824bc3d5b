use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Pagination variables understood by every paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageVariables {
    pub first: usize,
    pub skip: usize,
}

/// Executes one GraphQL query against an indexed data source.
#[async_trait]
pub trait SubgraphClient: Send + Sync {
    /// Returns the `data` object of the response. Fails with
    /// [`PipelineError::Query`] on transport problems and
    /// [`PipelineError::Schema`] when the source reports errors.
    async fn execute(&self, endpoint: &str, query: &str, variables: PageVariables) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

pub struct HttpSubgraphClient {
    client: reqwest::Client,
}

impl HttpSubgraphClient {
    pub fn new(timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SubgraphClient for HttpSubgraphClient {
    async fn execute(
        &self,
        endpoint: &str,
        query: &str,
        variables: PageVariables,
    ) -> Result<Value> {
        debug!(
            "Querying subgraph {} (first: {}, skip: {})",
            endpoint, variables.first, variables.skip
        );
        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?;

        let envelope: GraphQlEnvelope = response
            .json()
            .await
            .map_err(|e| PipelineError::Schema(format!("malformed response envelope: {}", e)))?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let message = Value::Array(errors).to_string();
            error!("Subgraph query error: {}", message);
            return Err(PipelineError::Schema(message));
        }

        envelope
            .data
            .ok_or_else(|| PipelineError::Schema("response carried no data".to_string()))
    }
}
