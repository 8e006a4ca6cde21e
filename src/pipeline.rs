//! Translator - question in, SPARQL (and optionally rows) out
//!
//! Runs extraction and synthesis for one request inside a span tagged with a
//! fresh request id, then hands the query to an executor when one is
//! configured.

use crate::error::{Nl2SparqlError, Result};
use crate::execution::{
    validate_query, ErrorClassifier, ExecutionErrorClass, ResultTable, SparqlExecutor,
};
use crate::extractor::Extractor;
use crate::nl_query::NLQuery;
use crate::synthesizer::{synthesize, SparqlQuery};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// One translated question
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub request_id: String,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub nl_query: NLQuery,
    pub sparql: SparqlQuery,
}

/// A failed execution together with its classification
#[derive(Debug)]
pub struct ExecutionFailure {
    pub class: ExecutionErrorClass,
    pub error: Nl2SparqlError,
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.error, self.class)
    }
}

impl std::error::Error for ExecutionFailure {}

pub struct Translator {
    extractor: Extractor,
    executor: Option<Arc<dyn SparqlExecutor>>,
    classifier: ErrorClassifier,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Extractor::new())
    }
}

impl Translator {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            executor: None,
            classifier: ErrorClassifier::new(),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn SparqlExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn translate(&self, question: &str) -> Translation {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("translate", request_id = %request_id);

        span.in_scope(|| {
            let nl_query = self.extractor.extract(question);
            let sparql = synthesize(&nl_query);
            info!(
                template = sparql.template(),
                query_type = %nl_query.query_type(),
                "Translated question"
            );
            Translation {
                request_id: request_id.clone(),
                question: question.to_string(),
                created_at: Utc::now(),
                nl_query,
                sparql,
            }
        })
    }

    /// Validate and run an already translated question
    pub async fn execute(
        &self,
        translation: &Translation,
    ) -> std::result::Result<ResultTable, ExecutionFailure> {
        let span = info_span!("execute", request_id = %translation.request_id);
        self.execute_inner(translation.sparql.as_str())
            .instrument(span)
            .await
            .map_err(|error| {
                let class = self.classifier.classify(&error);
                warn!(
                    request_id = %translation.request_id,
                    class = %class,
                    "Query execution failed: {}",
                    error
                );
                ExecutionFailure { class, error }
            })
    }

    async fn execute_inner(&self, sparql: &str) -> Result<ResultTable> {
        let executor = self.executor.as_ref().ok_or_else(|| {
            Nl2SparqlError::Config("No SPARQL executor configured".to_string())
        })?;
        validate_query(sparql)?;
        let table = executor.execute(sparql).await?;
        info!(executor = executor.name(), rows = table.row_count(), "Query executed");
        Ok(table)
    }

    /// Translate then execute
    pub async fn run(
        &self,
        question: &str,
    ) -> std::result::Result<(Translation, ResultTable), ExecutionFailure> {
        let translation = self.translate(question);
        let table = self.execute(&translation).await?;
        Ok((translation, table))
    }
}
