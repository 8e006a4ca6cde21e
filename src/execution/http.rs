//! HTTP SPARQL Executor
//!
//! SPARQL 1.1 Protocol client: the query is POSTed as a form field and the
//! response is read in the SPARQL 1.1 Query Results JSON format.

use crate::config::Config;
use crate::error::{Nl2SparqlError, Result};
use crate::execution::profile::validate_query;
use crate::execution::result::ResultTable;
use crate::execution::SparqlExecutor;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    head: SparqlHead,
    results: Option<SparqlResults>,
    boolean: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

fn is_loopback(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    )
}

/// Executor for a remote SPARQL endpoint
#[derive(Clone)]
pub struct HttpSparqlExecutor {
    endpoint: String,
    client: Client,
}

impl HttpSparqlExecutor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        let url = Url::parse(&endpoint).map_err(|e| {
            Nl2SparqlError::Config(format!("Invalid endpoint URL '{}': {}", endpoint, e))
        })?;

        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10));
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| Nl2SparqlError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            Nl2SparqlError::Config(
                "No SPARQL endpoint configured (set NL2SPARQL_ENDPOINT or pass --endpoint)"
                    .to_string(),
            )
        })?;
        Self::new(endpoint, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn into_table(response: SparqlResponse, execution_time_ms: u64) -> ResultTable {
        if let Some(answer) = response.boolean {
            return ResultTable::new(
                vec!["boolean".to_string()],
                vec![vec![Some(answer.to_string())]],
                execution_time_ms,
            );
        }

        let columns = response.head.vars;
        let rows = response
            .results
            .map(|r| r.bindings)
            .unwrap_or_default()
            .into_iter()
            .map(|mut binding| {
                columns
                    .iter()
                    .map(|var| binding.remove(var).map(|term| term.value))
                    .collect()
            })
            .collect();

        ResultTable::new(columns, rows, execution_time_ms)
    }
}

#[async_trait]
impl SparqlExecutor for HttpSparqlExecutor {
    fn name(&self) -> &str {
        "http"
    }

    async fn execute(&self, sparql: &str) -> Result<ResultTable> {
        validate_query(sparql)?;

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", RESULTS_JSON)
            .form(&[("query", sparql)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("SPARQL endpoint {} returned {}", self.endpoint, status);
            let message = format!("Endpoint returned {}: {}", status, text.trim());
            return Err(match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => Nl2SparqlError::EndpointUnavailable(message),
                _ => Nl2SparqlError::Execution(message),
            });
        }

        let body = response.text().await?;
        let parsed: SparqlResponse = serde_json::from_str(&body).map_err(|e| {
            Nl2SparqlError::Execution(format!("Failed to parse SPARQL results: {}", e))
        })?;

        let elapsed = start.elapsed().as_millis() as u64;
        let table = Self::into_table(parsed, elapsed);
        info!(
            "Executed query on {}: {} rows in {} ms",
            self.endpoint,
            table.row_count(),
            elapsed
        );
        Ok(table)
    }
}
