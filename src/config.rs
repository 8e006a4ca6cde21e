//! Runtime configuration
//!
//! Read from the process environment (after `.env` is loaded by the binary).
//! Command-line flags override individual values.

use crate::error::{Nl2SparqlError, Result};
use crate::vocabulary::{OntologyVocabulary, DEFAULT_VOCABULARY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ENDPOINT_VAR: &str = "NL2SPARQL_ENDPOINT";
pub const TIMEOUT_VAR: &str = "NL2SPARQL_TIMEOUT_SECS";
pub const VOCABULARY_VAR: &str = "NL2SPARQL_VOCABULARY";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SPARQL 1.1 Protocol query URL
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    /// JSON vocabulary overrides file
    pub vocabulary_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            vocabulary_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_secs = match get(TIMEOUT_VAR) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Nl2SparqlError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_VAR, raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(Nl2SparqlError::Config(format!(
                "{} must be greater than zero",
                TIMEOUT_VAR
            )));
        }

        Ok(Self {
            endpoint: get(ENDPOINT_VAR),
            timeout_secs,
            vocabulary_path: get(VOCABULARY_VAR).map(PathBuf::from),
        })
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn with_vocabulary_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.vocabulary_path = path;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Built-in vocabulary, extended by the overrides file when one is set
    pub fn load_vocabulary(&self) -> Result<Arc<OntologyVocabulary>> {
        match &self.vocabulary_path {
            Some(path) => Ok(Arc::new(OntologyVocabulary::from_overrides_file(path)?)),
            None => Ok(DEFAULT_VOCABULARY.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup(&[
            (ENDPOINT_VAR, "http://localhost:3030/cccm/query"),
            (TIMEOUT_VAR, " 5 "),
            (VOCABULARY_VAR, "vocab.json"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:3030/cccm/query"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.vocabulary_path, Some(PathBuf::from("vocab.json")));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        let err = Config::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, Nl2SparqlError::Config(_)));
        assert!(Config::from_lookup(lookup(&[(TIMEOUT_VAR, "0")])).is_err());
    }

    #[test]
    fn test_flags_override_env() {
        let config = Config::from_lookup(lookup(&[(ENDPOINT_VAR, "http://env")]))
            .unwrap()
            .with_endpoint(Some("http://flag".to_string()))
            .with_vocabulary_path(None);
        assert_eq!(config.endpoint.as_deref(), Some("http://flag"));
        assert_eq!(config.vocabulary_path, None);
    }

    #[test]
    fn test_missing_vocabulary_file_is_an_error() {
        let config = Config::default()
            .with_vocabulary_path(Some(PathBuf::from("/nonexistent/nl2sparql/vocab.json")));
        assert!(config.load_vocabulary().is_err());
    }
}
