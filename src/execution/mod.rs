//! Execution - Running generated SPARQL against a knowledge base
//!
//! The translator only produces text. Anything that can answer a SELECT with
//! a table implements [`SparqlExecutor`]; [`HttpSparqlExecutor`] speaks the
//! SPARQL 1.1 Protocol to a remote endpoint.

pub mod error_classifier;
pub mod http;
pub mod profile;
pub mod result;

pub use error_classifier::{ErrorClassifier, ExecutionErrorClass};
pub use http::HttpSparqlExecutor;
pub use profile::{parse_query, validate_query, QueryForm, QueryProfile};
pub use result::ResultTable;

use crate::error::{Nl2SparqlError, Result};
use crate::ontology::{prefix_declaration, CCCM_NAMESPACE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[async_trait]
pub trait SparqlExecutor: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str;

    async fn execute(&self, sparql: &str) -> Result<ResultTable>;
}

/// Size of the dataset behind an executor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub total_triples: u64,
    /// `cccm:` class local name -> instance count
    pub class_counts: BTreeMap<String, u64>,
}

fn local_name(iri: &str) -> String {
    iri.rsplit('#').next().unwrap_or(iri).to_string()
}

fn parse_count(cell: Option<&str>) -> Result<u64> {
    let raw = cell.ok_or_else(|| Nl2SparqlError::Execution("Missing count value".to_string()))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|e| Nl2SparqlError::Execution(format!("Invalid count '{}': {}", raw, e)))
}

fn namespace_filter(var: &str) -> String {
    format!("FILTER(STRSTARTS(STR({}), \"{}\"))", var, CCCM_NAMESPACE)
}

pub async fn statistics(executor: &dyn SparqlExecutor) -> Result<DatasetStatistics> {
    let triples = executor
        .execute("SELECT (COUNT(*) AS ?triples) WHERE { ?s ?p ?o }")
        .await?;
    let total_triples = match triples.rows.first() {
        Some(row) => parse_count(row.first().and_then(|c| c.as_deref()))?,
        None => 0,
    };

    let query = format!(
        "{}PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
SELECT ?class (COUNT(?instance) AS ?count)
WHERE {{
  ?instance rdf:type ?class .
  {}
}}
GROUP BY ?class
ORDER BY DESC(?count)",
        prefix_declaration(),
        namespace_filter("?class")
    );
    let table = executor.execute(&query).await?;

    let mut class_counts = BTreeMap::new();
    for row in &table.rows {
        let class = match row.first().and_then(|c| c.as_deref()) {
            Some(iri) => local_name(iri),
            None => continue,
        };
        let count = parse_count(row.get(1).and_then(|c| c.as_deref()))?;
        class_counts.insert(class, count);
    }

    debug!(
        "Dataset has {} triples across {} classes",
        total_triples,
        class_counts.len()
    );
    Ok(DatasetStatistics {
        total_triples,
        class_counts,
    })
}

async fn distinct_local_names(executor: &dyn SparqlExecutor, query: &str) -> Result<Vec<String>> {
    let table = executor.execute(query).await?;
    let mut names: Vec<String> = table
        .rows
        .iter()
        .filter_map(|row| row.first().and_then(|c| c.as_deref()))
        .map(local_name)
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// Every `cccm:` class with at least one instance
pub async fn list_classes(executor: &dyn SparqlExecutor) -> Result<Vec<String>> {
    let query = format!(
        "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
SELECT DISTINCT ?class
WHERE {{
  ?instance rdf:type ?class .
  {}
}}",
        namespace_filter("?class")
    );
    distinct_local_names(executor, &query).await
}

/// Every `cccm:` property used in at least one triple
pub async fn list_properties(executor: &dyn SparqlExecutor) -> Result<Vec<String>> {
    let query = format!(
        "SELECT DISTINCT ?property
WHERE {{
  ?subject ?property ?object .
  {}
}}",
        namespace_filter("?property")
    );
    distinct_local_names(executor, &query).await
}
