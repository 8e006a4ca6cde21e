pub mod config;
pub mod error;
pub mod execution;
pub mod extractor;
pub mod nl_query;
pub mod ontology;
pub mod pipeline;
pub mod synthesizer;
pub mod token;
pub mod vocabulary;

pub use config::Config;
pub use error::{Nl2SparqlError, Result};
pub use execution::{HttpSparqlExecutor, ResultTable, SparqlExecutor};
pub use extractor::Extractor;
pub use nl_query::NLQuery;
pub use pipeline::{Translation, Translator};
pub use synthesizer::{synthesize, SparqlQuery};
pub use vocabulary::OntologyVocabulary;

/// Questions the CLI `examples` command translates
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "List all customers",
    "Show customers in India",
    "List customers living in UK",
    "Show customers based in USA",
    "List all banks",
    "Show institutions in India",
    "List all fintechs",
    "List all transactions",
    "Show all remittances",
    "List customers who initiated transactions",
    "Show customers who initiated remittances",
    "List transactions and their processing institutions",
    "Show completed transactions",
    "List failed transactions",
    "Count customers",
    "Show customers with total number of accounts",
    "List customers with their accounts",
    "List institutions based in India",
    "Show customers with multiple accounts",
    "Show remittances processed by fintech",
    "Show remittances over 200000",
    "Find cross-border transactions",
    "Compare banks vs fintechs by number of transactions",
    "Show the full money trail for each customer",
    "Which customers use both banks and fintechs",
    "Show customers with foreign accounts",
    "Show transactions that lost more than 5% in conversion",
    "Who is the top customer by transaction amount",
    "Which fintech processed the most remittances",
    "Show the highest exchange rates",
    "Show transactions processed by ICICI",
    "Show transactions from USD to INR",
    "Count accounts per customer sorted desc",
    "Show currencies",
];
