//! NLQuery - Structured intermediate representation
//!
//! Produced once per question by the extractor and handed by reference to the
//! synthesizer. Nothing downstream mutates it.

use crate::ontology::{OntologyClass, OntologyProperty};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What the user asked us to do with the matched entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    List,
    Count,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub function: AggregateFunction,
    /// SPARQL variable the aggregate is applied to (`?acc` or `?item`)
    pub target_variable: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub variable: String,
    pub direction: SortDirection,
}

/// Query shapes that bypass the class/aggregation cascade entirely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecialPattern {
    HavingMultiple,
    CrossBorder,
    Comparison,
    FullChain,
    BothTypes,
    Foreign,
    LossFilter,
    Top,
}

impl SpecialPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialPattern::HavingMultiple => "HAVING_MULTIPLE",
            SpecialPattern::CrossBorder => "CROSS_BORDER",
            SpecialPattern::Comparison => "COMPARISON",
            SpecialPattern::FullChain => "FULL_CHAIN",
            SpecialPattern::BothTypes => "BOTH_TYPES",
            SpecialPattern::Foreign => "FOREIGN",
            SpecialPattern::LossFilter => "LOSS_FILTER",
            SpecialPattern::Top => "TOP",
        }
    }
}

impl fmt::Display for SpecialPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "=")]
    Equal,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::Equal => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonSemantic {
    LossPercentage,
}

/// Numeric threshold and/or percentage detected in the question.
/// Both halves are optional and may coexist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ComparisonOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<ComparisonSemantic>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.operator.is_none()
            && self.value.is_none()
            && self.percentage.is_none()
            && self.semantic_type.is_none()
    }

    pub fn is_loss_percentage(&self) -> bool {
        self.semantic_type == Some(ComparisonSemantic::LossPercentage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterKey {
    #[serde(rename = "basedIn")]
    BasedIn,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "credits")]
    Credits,
    #[serde(rename = "balance")]
    Balance,
    #[serde(rename = "fromCurrency")]
    FromCurrency,
    #[serde(rename = "toCurrency")]
    ToCurrency,
    /// Proper-noun run after a preposition. Detected, never used by templates.
    #[serde(rename = "entity_name")]
    EntityName,
}

impl FilterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::BasedIn => "basedIn",
            FilterKey::Status => "status",
            FilterKey::Age => "age",
            FilterKey::Credits => "credits",
            FilterKey::Balance => "balance",
            FilterKey::FromCurrency => "fromCurrency",
            FilterKey::ToCurrency => "toCurrency",
            FilterKey::EntityName => "entity_name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(i) => write!(f, "{}", i),
            FilterValue::Decimal(d) => write!(f, "{}", d),
            FilterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Structured reading of one natural-language question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NLQuery {
    pub original_query: String,
    pub tokens: Vec<String>,
    pub lemmas: Vec<String>,
    pub pos_tags: Vec<String>,
    /// Tokens with stopwords and punctuation removed
    pub filtered_tokens: Vec<String>,
    pub intent: Intent,
    pub detected_classes: BTreeSet<OntologyClass>,
    pub detected_properties: BTreeSet<OntologyProperty>,
    pub filters: BTreeMap<FilterKey, FilterValue>,
    pub aggregation: Option<Aggregation>,
    pub order_by: Option<OrderBy>,
    pub special_pattern: Option<SpecialPattern>,
    pub comparison: Option<Comparison>,
    pub specific_entity: Option<String>,
}

impl NLQuery {
    pub fn has_class(&self, class: OntologyClass) -> bool {
        self.detected_classes.contains(&class)
    }

    pub fn has_any_class(&self, classes: &[OntologyClass]) -> bool {
        classes.iter().any(|c| self.detected_classes.contains(c))
    }

    pub fn has_property(&self, property: OntologyProperty) -> bool {
        self.detected_properties.contains(&property)
    }

    /// True when `word` appears among the tokens or lemmas
    pub fn mentions(&self, word: &str) -> bool {
        self.tokens.iter().chain(self.lemmas.iter()).any(|t| t == word)
    }

    pub fn filter(&self, key: FilterKey) -> Option<&FilterValue> {
        self.filters.get(&key)
    }

    pub fn filter_text(&self, key: FilterKey) -> Option<&str> {
        self.filters.get(&key).and_then(FilterValue::as_text)
    }

    /// Threshold value captured from a comparison word, if any
    pub fn comparison_value(&self) -> Option<f64> {
        self.comparison.as_ref().and_then(|c| c.value)
    }

    /// Coarse label of the expected query shape
    pub fn query_type(&self) -> String {
        if let Some(pattern) = self.special_pattern {
            format!("SELECT_{}", pattern)
        } else if self.aggregation.is_some() {
            "SELECT_AGGREGATION".to_string()
        } else {
            "SELECT".to_string()
        }
    }
}
