use thiserror::Error;

#[derive(Error, Debug)]
pub enum Nl2SparqlError {
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid SPARQL query: {0}")]
    InvalidQuery(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Endpoint unavailable: {0}")]
    EndpointUnavailable(String),

    #[error("Query timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Nl2SparqlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Nl2SparqlError::Timeout(err.to_string())
        } else if err.is_connect() {
            Nl2SparqlError::EndpointUnavailable(err.to_string())
        } else {
            Nl2SparqlError::Execution(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Nl2SparqlError>;
