//! Error Classifier
//!
//! Sorts execution failures into a small taxonomy so callers can tell a bad
//! query from a flaky endpoint.

use crate::error::Nl2SparqlError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionErrorClass {
    /// The text is not valid SPARQL
    Syntax,
    /// The query references a prefix, class or property the dataset lacks
    UnknownTerm,
    EndpointUnavailable,
    Timeout,
    Execution(String),
}

impl ExecutionErrorClass {
    /// Worth sending the same query again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExecutionErrorClass::EndpointUnavailable | ExecutionErrorClass::Timeout
        )
    }
}

impl fmt::Display for ExecutionErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionErrorClass::Syntax => write!(f, "Syntax"),
            ExecutionErrorClass::UnknownTerm => write!(f, "UnknownTerm"),
            ExecutionErrorClass::EndpointUnavailable => write!(f, "EndpointUnavailable"),
            ExecutionErrorClass::Timeout => write!(f, "Timeout"),
            ExecutionErrorClass::Execution(msg) => write!(f, "Execution({})", msg),
        }
    }
}

pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, error: &Nl2SparqlError) -> ExecutionErrorClass {
        match error {
            Nl2SparqlError::InvalidQuery(_) => return ExecutionErrorClass::Syntax,
            Nl2SparqlError::EndpointUnavailable(_) => {
                return ExecutionErrorClass::EndpointUnavailable
            }
            Nl2SparqlError::Timeout(_) => return ExecutionErrorClass::Timeout,
            _ => {}
        }

        // Endpoints report everything else as free text
        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("parse error")
            || error_msg.contains("syntax error")
            || error_msg.contains("malformed query")
        {
            return ExecutionErrorClass::Syntax;
        }

        if (error_msg.contains("prefix") || error_msg.contains("undefined"))
            && (error_msg.contains("unknown")
                || error_msg.contains("not defined")
                || error_msg.contains("undefined"))
        {
            return ExecutionErrorClass::UnknownTerm;
        }

        if error_msg.contains("timed out") || error_msg.contains("timeout") {
            return ExecutionErrorClass::Timeout;
        }

        if error_msg.contains("503")
            || error_msg.contains("502")
            || error_msg.contains("connection refused")
            || error_msg.contains("service unavailable")
        {
            return ExecutionErrorClass::EndpointUnavailable;
        }

        ExecutionErrorClass::Execution(error.to_string())
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
