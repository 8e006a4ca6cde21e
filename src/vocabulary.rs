//! Ontology Vocabulary
//!
//! Closed keyword tables the extractor matches against. The built-in set is
//! created once per process; operators may extend it from a JSON overrides
//! file at startup, after which it is frozen.

use crate::error::{Nl2SparqlError, Result};
use crate::nl_query::{AggregateFunction, ComparisonOperator, Intent, SpecialPattern};
use crate::ontology::{OntologyClass, OntologyProperty};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

lazy_static! {
    /// Built-in vocabulary shared by every request
    pub static ref DEFAULT_VOCABULARY: Arc<OntologyVocabulary> =
        Arc::new(OntologyVocabulary::builtin());

    static ref LOCAL_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$")
        .expect("local name pattern is valid");
}

/// Read-only keyword tables
#[derive(Debug, Clone)]
pub struct OntologyVocabulary {
    classes: HashMap<String, OntologyClass>,
    properties: HashMap<String, OntologyProperty>,
    countries: HashMap<String, String>,
    statuses: HashMap<String, String>,
    intents: HashMap<String, Intent>,
    aggregations: HashMap<String, AggregateFunction>,
    comparisons: HashMap<String, ComparisonOperator>,
    special_patterns: HashMap<String, SpecialPattern>,
    /// Substring → institution individual, tested in this order
    institutions: Vec<(String, String)>,
    /// ISO codes searched for in the raw question, in this order
    currencies: Vec<String>,
}

fn table<V: Clone>(entries: &[(&str, V)]) -> HashMap<String, V> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

impl OntologyVocabulary {
    pub fn builtin() -> Self {
        use OntologyClass as C;
        use OntologyProperty as P;

        let classes = table(&[
            ("customer", C::Customer),
            ("customers", C::Customer),
            ("people", C::Customer),
            ("person", C::Customer),
            ("user", C::Customer),
            ("users", C::Customer),
            ("transaction", C::Transaction),
            ("transactions", C::Transaction),
            ("txn", C::Transaction),
            ("transfer", C::Transaction),
            ("transfers", C::Transaction),
            ("remittance", C::Remittance),
            ("remittances", C::Remittance),
            ("remit", C::Remittance),
            ("account", C::Account),
            ("accounts", C::Account),
            ("acc", C::Account),
            ("bank", C::Bank),
            ("banks", C::Bank),
            ("fintech", C::FinTech),
            ("fintechs", C::FinTech),
            ("institution", C::Institution),
            ("institutions", C::Institution),
            ("currency", C::Currency),
            ("currencies", C::Currency),
            ("country", C::Country),
            ("countries", C::Country),
            ("rate", C::Rate),
            ("rates", C::Rate),
            ("exchange", C::Rate),
            ("status", C::Status),
        ]);

        let properties = table(&[
            ("name", P::FullName),
            ("names", P::FullName),
            ("fullname", P::FullName),
            ("full", P::FullName),
            ("country", P::BasedIn),
            ("location", P::BasedIn),
            ("based", P::BasedIn),
            ("living", P::BasedIn),
            ("live", P::BasedIn),
            ("from", P::BasedIn),
            ("amount", P::AmountSent),
            ("sent", P::AmountSent),
            ("send", P::AmountSent),
            ("received", P::AmountReceived),
            ("receive", P::AmountReceived),
            ("initiated", P::InitiatedBy),
            ("initiate", P::InitiatedBy),
            ("sender", P::InitiatedBy),
            ("processed", P::ProcessedBy),
            ("process", P::ProcessedBy),
            ("processor", P::ProcessedBy),
            ("account", P::HasAccount),
            ("accounts", P::HasAccount),
            ("balance", P::Balance),
            ("status", P::HasStatus),
            ("state", P::HasStatus),
            ("bankname", P::BankName),
            ("currency", P::FromCurrency),
            ("fromcurrency", P::FromCurrency),
            ("tocurrency", P::ToCurrency),
            ("rate", P::AppliedRate),
        ]);

        let countries = table(&[
            ("india", "India".to_string()),
            ("indian", "India".to_string()),
            ("uk", "UK".to_string()),
            ("britain", "UK".to_string()),
            ("england", "UK".to_string()),
            ("usa", "USA".to_string()),
            ("america", "USA".to_string()),
            ("us", "USA".to_string()),
            ("united states", "USA".to_string()),
        ]);

        let statuses = table(&[
            ("completed", "Completed".to_string()),
            ("complete", "Completed".to_string()),
            ("success", "Completed".to_string()),
            ("successful", "Completed".to_string()),
            ("pending", "Pending".to_string()),
            ("failed", "Failed".to_string()),
            ("failure", "Failed".to_string()),
            ("fail", "Failed".to_string()),
        ]);

        let intents = table(&[
            ("list", Intent::List),
            ("show", Intent::List),
            ("display", Intent::List),
            ("get", Intent::List),
            ("retrieve", Intent::List),
            ("find", Intent::List),
            ("fetch", Intent::List),
            ("count", Intent::Count),
            ("number", Intent::Count),
            ("total", Intent::Count),
            ("how many", Intent::Count),
            ("filter", Intent::Filter),
            ("where", Intent::Filter),
            ("with", Intent::Filter),
        ]);

        let aggregations = table(&[
            ("count", AggregateFunction::Count),
            ("total", AggregateFunction::Count),
            ("number", AggregateFunction::Count),
            ("sum", AggregateFunction::Sum),
            ("average", AggregateFunction::Avg),
            ("avg", AggregateFunction::Avg),
            ("minimum", AggregateFunction::Min),
            ("min", AggregateFunction::Min),
            ("maximum", AggregateFunction::Max),
            ("max", AggregateFunction::Max),
            ("highest", AggregateFunction::Max),
            ("lowest", AggregateFunction::Min),
        ]);

        let comparisons = table(&[
            ("greater", ComparisonOperator::GreaterThan),
            ("more", ComparisonOperator::GreaterThan),
            ("over", ComparisonOperator::GreaterThan),
            ("above", ComparisonOperator::GreaterThan),
            ("less", ComparisonOperator::LessThan),
            ("under", ComparisonOperator::LessThan),
            ("below", ComparisonOperator::LessThan),
            ("equal", ComparisonOperator::Equal),
            ("equals", ComparisonOperator::Equal),
        ]);

        let special_patterns = table(&[
            ("multiple", SpecialPattern::HavingMultiple),
            ("both", SpecialPattern::BothTypes),
            ("cross-border", SpecialPattern::CrossBorder),
            ("international", SpecialPattern::CrossBorder),
            ("foreign", SpecialPattern::Foreign),
            ("highest", SpecialPattern::Top),
            ("top", SpecialPattern::Top),
            ("most", SpecialPattern::Top),
            ("trail", SpecialPattern::FullChain),
            ("chain", SpecialPattern::FullChain),
            ("compare", SpecialPattern::Comparison),
            ("versus", SpecialPattern::Comparison),
            ("vs", SpecialPattern::Comparison),
        ]);

        let institutions = [
            ("icici", "ICICI_Bank"),
            ("hdfc", "HDFC"),
            ("axis", "Axis_Bank"),
            ("kotak", "Kotak_Bank"),
            ("wise", "Wise"),
            ("paytm", "Paytm"),
            ("phonepe", "PhonePe"),
            ("razorpay", "Razorpay"),
            ("barclays", "Barclays"),
            ("chase", "Chase"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let currencies = ["usd", "inr", "gbp", "eur", "jpy", "aud"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        Self {
            classes,
            properties,
            countries,
            statuses,
            intents,
            aggregations,
            comparisons,
            special_patterns,
            institutions,
            currencies,
        }
    }

    /// Built-in tables extended with operator-supplied keywords
    pub fn with_overrides(overrides: &VocabularyOverrides) -> Result<Self> {
        let mut vocabulary = Self::builtin();
        vocabulary.apply(overrides)?;
        Ok(vocabulary)
    }

    /// Load built-in tables plus the overrides file at `path`
    pub fn from_overrides_file(path: &Path) -> Result<Self> {
        let overrides = VocabularyOverrides::load(path)?;
        let vocabulary = Self::with_overrides(&overrides)?;
        info!(
            "Loaded vocabulary overrides from {} ({} entries)",
            path.display(),
            overrides.len()
        );
        Ok(vocabulary)
    }

    fn apply(&mut self, overrides: &VocabularyOverrides) -> Result<()> {
        for (keyword, class_name) in &overrides.classes {
            let class = class_name
                .parse::<OntologyClass>()
                .map_err(Nl2SparqlError::Vocabulary)?;
            self.classes.insert(normalize_keyword(keyword)?, class);
        }

        for (keyword, property_name) in &overrides.properties {
            let property = property_name
                .parse::<OntologyProperty>()
                .map_err(Nl2SparqlError::Vocabulary)?;
            self.properties.insert(normalize_keyword(keyword)?, property);
        }

        for (keyword, country) in &overrides.countries {
            self.countries
                .insert(normalize_keyword(keyword)?, validate_local_name(country)?);
        }

        for (keyword, status) in &overrides.statuses {
            self.statuses
                .insert(normalize_keyword(keyword)?, validate_local_name(status)?);
        }

        Ok(())
    }

    pub fn class_for(&self, word: &str) -> Option<OntologyClass> {
        self.classes.get(word).copied()
    }

    pub fn property_for(&self, word: &str) -> Option<OntologyProperty> {
        self.properties.get(word).copied()
    }

    pub fn country_for(&self, word: &str) -> Option<&str> {
        self.countries.get(word).map(String::as_str)
    }

    pub fn status_for(&self, word: &str) -> Option<&str> {
        self.statuses.get(word).map(String::as_str)
    }

    pub fn intent_for(&self, word: &str) -> Option<Intent> {
        self.intents.get(word).copied()
    }

    pub fn aggregation_for(&self, word: &str) -> Option<AggregateFunction> {
        self.aggregations.get(word).copied()
    }

    pub fn comparison_for(&self, word: &str) -> Option<ComparisonOperator> {
        self.comparisons.get(word).copied()
    }

    pub fn special_pattern_for(&self, word: &str) -> Option<SpecialPattern> {
        self.special_patterns.get(word).copied()
    }

    pub fn institutions(&self) -> &[(String, String)] {
        &self.institutions
    }

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }
}

impl Default for OntologyVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Operator-supplied keyword additions (JSON)
///
/// ```json
/// { "classes": { "client": "Customer" }, "countries": { "pak": "Pakistan" } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyOverrides {
    #[serde(default)]
    pub classes: HashMap<String, String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub countries: HashMap<String, String>,
    #[serde(default)]
    pub statuses: HashMap<String, String>,
}

impl VocabularyOverrides {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| {
            Nl2SparqlError::Vocabulary(format!("Failed to parse vocabulary overrides: {}", e))
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.properties.len() + self.countries.len() + self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_keyword(keyword: &str) -> Result<String> {
    let normalized = keyword.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Nl2SparqlError::Vocabulary(
            "Vocabulary keywords must not be empty".to_string(),
        ));
    }
    Ok(normalized)
}

/// Values are interpolated into queries as `cccm:` local names, so they must
/// be plain identifiers.
fn validate_local_name(value: &str) -> Result<String> {
    if LOCAL_NAME.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(Nl2SparqlError::Vocabulary(format!(
            "'{}' is not a valid ontology local name",
            value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookups() {
        let vocabulary = OntologyVocabulary::builtin();
        assert_eq!(vocabulary.class_for("customers"), Some(OntologyClass::Customer));
        assert_eq!(vocabulary.property_for("processed"), Some(OntologyProperty::ProcessedBy));
        assert_eq!(vocabulary.country_for("england"), Some("UK"));
        assert_eq!(vocabulary.status_for("fail"), Some("Failed"));
        assert_eq!(vocabulary.special_pattern_for("vs"), Some(SpecialPattern::Comparison));
        assert_eq!(vocabulary.institutions()[0].1, "ICICI_Bank");
        assert_eq!(vocabulary.currencies().len(), 6);
        assert_eq!(vocabulary.class_for("unicorn"), None);
    }

    #[test]
    fn test_overrides_extend_tables() {
        let overrides = VocabularyOverrides::from_json(
            r#"{
                "classes": { "Client": "Customer" },
                "properties": { "title": "fullName" },
                "countries": { "pak": "Pakistan" }
            }"#,
        )
        .unwrap();
        let vocabulary = OntologyVocabulary::with_overrides(&overrides).unwrap();

        assert_eq!(vocabulary.class_for("client"), Some(OntologyClass::Customer));
        assert_eq!(vocabulary.property_for("title"), Some(OntologyProperty::FullName));
        assert_eq!(vocabulary.country_for("pak"), Some("Pakistan"));
        // built-ins survive
        assert_eq!(vocabulary.country_for("india"), Some("India"));
    }

    #[test]
    fn test_overrides_reject_unknown_class() {
        let overrides =
            VocabularyOverrides::from_json(r#"{ "classes": { "wallet": "Wallet" } }"#).unwrap();
        let err = OntologyVocabulary::with_overrides(&overrides).unwrap_err();
        assert!(matches!(err, Nl2SparqlError::Vocabulary(_)));
    }

    #[test]
    fn test_overrides_reject_unsafe_local_name() {
        let overrides = VocabularyOverrides::from_json(
            r#"{ "countries": { "evil": "India . } DROP" } }"#,
        )
        .unwrap();
        let err = OntologyVocabulary::with_overrides(&overrides).unwrap_err();
        assert!(err.to_string().contains("not a valid ontology local name"));
    }

    #[test]
    fn test_overrides_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "nl2sparql_vocab_{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, r#"{ "statuses": { "stuck": "Pending" } }"#).unwrap();

        let vocabulary = OntologyVocabulary::from_overrides_file(&path).unwrap();
        assert_eq!(vocabulary.status_for("stuck"), Some("Pending"));

        std::fs::remove_file(&path).ok();
    }
}
