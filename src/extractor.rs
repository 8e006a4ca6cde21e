//! Entity/Intent Extractor
//!
//! Turns a question into an [`NLQuery`] by running a set of independent
//! detection rules over the token stream and the lowercased raw text.
//! Every rule is total: a missing signal leaves its field empty.

use crate::nl_query::{
    AggregateFunction, Aggregation, Comparison, ComparisonSemantic, FilterKey, FilterValue,
    Intent, NLQuery, OrderBy, SortDirection, SpecialPattern,
};
use crate::ontology::{OntologyClass, OntologyProperty};
use crate::token::{PosTag, RuleTokenizer, Token, TokenSource};
use crate::vocabulary::{OntologyVocabulary, DEFAULT_VOCABULARY};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref PERCENTAGE: Regex =
        Regex::new(r"(\d+)\s*(?:%|percent)").expect("percentage pattern is valid");
}

const AGE_CUES: &[&str] = &["age", "aged", "years"];
const CREDIT_CUES: &[&str] = &["credit", "credits"];
const BALANCE_CUES: &[&str] = &["balance"];
const ENTITY_PREPOSITIONS: &[&str] = &["in", "at", "with", "for"];
const ORDER_WORDS: &[&str] = &["order", "sort", "arrange"];

/// Variable the ORDER BY clause sorts on. Fixed regardless of the aggregate.
pub const ORDER_VARIABLE: &str = "?NumAcc";

/// Normalised views of one question that the detection rules share
#[derive(Debug, Clone)]
pub struct QuestionText<'a> {
    /// Full stream, punctuation included
    pub stream: &'a [Token],
    /// Lowercased non-punctuation tokens
    pub tokens: Vec<String>,
    /// Lemmas parallel to `tokens`
    pub lemmas: Vec<String>,
    /// Lowercased raw question
    pub raw: String,
}

impl<'a> QuestionText<'a> {
    pub fn new(raw_text: &str, stream: &'a [Token]) -> Self {
        let words: Vec<&Token> = stream.iter().filter(|t| !t.is_punct).collect();
        Self {
            stream,
            tokens: words.iter().map(|t| t.text.to_lowercase()).collect(),
            lemmas: words.iter().map(|t| t.lemma.to_lowercase()).collect(),
            raw: raw_text.to_lowercase(),
        }
    }

    /// Tokens followed by lemmas, the scan order most rules use
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .chain(self.lemmas.iter())
            .map(String::as_str)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words().any(|w| w == word)
    }
}

/// Extractor bound to one vocabulary and one token source
#[derive(Clone)]
pub struct Extractor {
    vocabulary: Arc<OntologyVocabulary>,
    token_source: Arc<dyn TokenSource>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_vocabulary(DEFAULT_VOCABULARY.clone())
    }

    pub fn with_vocabulary(vocabulary: Arc<OntologyVocabulary>) -> Self {
        Self {
            vocabulary,
            token_source: Arc::new(RuleTokenizer::new()),
        }
    }

    pub fn with_token_source(mut self, token_source: Arc<dyn TokenSource>) -> Self {
        self.token_source = token_source;
        self
    }

    pub fn vocabulary(&self) -> &OntologyVocabulary {
        &self.vocabulary
    }

    /// Tokenize and analyse a question
    pub fn extract(&self, raw_text: &str) -> NLQuery {
        let stream = self.token_source.tokenize(raw_text);
        self.extract_tokens(raw_text, &stream)
    }

    /// Analyse a question whose token stream was produced elsewhere
    pub fn extract_tokens(&self, raw_text: &str, stream: &[Token]) -> NLQuery {
        let vocab = self.vocabulary.as_ref();
        let text = QuestionText::new(raw_text, stream);

        let words: Vec<&Token> = stream.iter().filter(|t| !t.is_punct).collect();
        let pos_tags = words.iter().map(|t| t.pos.as_str().to_string()).collect();
        let filtered_tokens = words
            .iter()
            .filter(|t| !t.is_stop)
            .map(|t| t.text.to_lowercase())
            .collect();

        let query = NLQuery {
            original_query: raw_text.to_string(),
            intent: detect_intent(&text, vocab),
            detected_classes: detect_classes(&text, vocab),
            detected_properties: detect_properties(&text, vocab),
            filters: detect_filters(&text, vocab),
            aggregation: detect_aggregation(&text, vocab),
            order_by: detect_ordering(&text),
            special_pattern: detect_special_pattern(&text, vocab),
            comparison: detect_comparison(&text, vocab),
            specific_entity: detect_specific_institution(&text, vocab),
            tokens: text.tokens.clone(),
            lemmas: text.lemmas.clone(),
            pos_tags,
            filtered_tokens,
        };

        debug!(
            intent = ?query.intent,
            classes = ?query.detected_classes,
            properties = ?query.detected_properties,
            special_pattern = ?query.special_pattern,
            "Extracted NLQuery"
        );

        query
    }
}

pub fn detect_intent(text: &QuestionText, vocab: &OntologyVocabulary) -> Intent {
    text.words()
        .find_map(|w| vocab.intent_for(w))
        .unwrap_or_default()
}

pub fn detect_classes(text: &QuestionText, vocab: &OntologyVocabulary) -> BTreeSet<OntologyClass> {
    text.words().filter_map(|w| vocab.class_for(w)).collect()
}

pub fn detect_properties(
    text: &QuestionText,
    vocab: &OntologyVocabulary,
) -> BTreeSet<OntologyProperty> {
    text.words().filter_map(|w| vocab.property_for(w)).collect()
}

/// Single pass over every filter rule; later rules overwrite earlier keys
pub fn detect_filters(
    text: &QuestionText,
    vocab: &OntologyVocabulary,
) -> BTreeMap<FilterKey, FilterValue> {
    let mut filters = BTreeMap::new();

    if let Some(country) = text.words().find_map(|w| vocab.country_for(w)) {
        filters.insert(FilterKey::BasedIn, FilterValue::Text(country.to_string()));
    }

    if let Some(status) = text.words().find_map(|w| vocab.status_for(w)) {
        filters.insert(FilterKey::Status, FilterValue::Text(status.to_string()));
    }

    detect_numeric_filters(text.stream, &mut filters);
    detect_currency_filters(&text.raw, vocab, &mut filters);
    detect_entity_name(text.stream, &mut filters);

    filters
}

/// "aged 21", "with credits 3", "balance 5000.50"
fn detect_numeric_filters(stream: &[Token], filters: &mut BTreeMap<FilterKey, FilterValue>) {
    for (i, token) in stream.iter().enumerate() {
        if !token.like_num || i == 0 {
            continue;
        }
        let previous = stream[i - 1].text.to_lowercase();
        let digits = token.text.replace(',', "");

        if AGE_CUES.contains(&previous.as_str()) {
            if let Ok(age) = digits.parse::<i64>() {
                filters.insert(FilterKey::Age, FilterValue::Integer(age));
            }
        } else if CREDIT_CUES.contains(&previous.as_str()) {
            if let Ok(credits) = digits.parse::<i64>() {
                filters.insert(FilterKey::Credits, FilterValue::Integer(credits));
            }
        } else if BALANCE_CUES.contains(&previous.as_str()) {
            if let Ok(balance) = digits.parse::<f64>() {
                filters.insert(FilterKey::Balance, FilterValue::Decimal(balance));
            }
        }
    }
}

/// Plain substring scan in table order, so a later code overwrites an
/// earlier one. Any "from" in the question tags the code as the source; a
/// code whose first occurrence precedes the first "to" is the target.
fn detect_currency_filters(
    raw: &str,
    vocab: &OntologyVocabulary,
    filters: &mut BTreeMap<FilterKey, FilterValue>,
) {
    let has_from = raw.contains("from");
    let first_to = raw.find("to");

    for code in vocab.currencies() {
        let position = match raw.find(code.as_str()) {
            Some(position) => position,
            None => continue,
        };
        if has_from {
            filters.insert(FilterKey::FromCurrency, FilterValue::Text(code.to_uppercase()));
        }
        if first_to.map_or(false, |to| to > position) {
            filters.insert(FilterKey::ToCurrency, FilterValue::Text(code.to_uppercase()));
        }
    }
}

fn is_proper_noun(token: &Token) -> bool {
    token.pos == PosTag::Propn || token.is_proper
}

/// Proper-noun run after a preposition. The last run in the question wins.
fn detect_entity_name(stream: &[Token], filters: &mut BTreeMap<FilterKey, FilterValue>) {
    for (i, token) in stream.iter().enumerate() {
        let preposition = token.text.to_lowercase();
        if !ENTITY_PREPOSITIONS.contains(&preposition.as_str()) {
            continue;
        }
        let run: Vec<&str> = stream[i + 1..]
            .iter()
            .take_while(|t| is_proper_noun(t))
            .map(|t| t.text.as_str())
            .collect();
        if !run.is_empty() {
            filters.insert(FilterKey::EntityName, FilterValue::Text(run.join(" ")));
        }
    }
}

fn aggregation_variable(text: &QuestionText) -> String {
    if text.contains_word("account") {
        "?acc".to_string()
    } else {
        "?item".to_string()
    }
}

pub fn detect_aggregation(text: &QuestionText, vocab: &OntologyVocabulary) -> Option<Aggregation> {
    if let Some(function) = text.words().find_map(|w| vocab.aggregation_for(w)) {
        return Some(Aggregation {
            function,
            target_variable: aggregation_variable(text),
        });
    }

    // "total number of ..." split across tokens the table does not know
    let joined = text.tokens.join(" ");
    if joined.contains("total") && joined.contains("number") {
        return Some(Aggregation {
            function: AggregateFunction::Count,
            target_variable: aggregation_variable(text),
        });
    }

    None
}

pub fn detect_ordering(text: &QuestionText) -> Option<OrderBy> {
    let has_order = ORDER_WORDS.iter().any(|w| text.contains_word(w));
    let descending = text.contains_word("desc");

    if !has_order && !descending {
        return None;
    }

    Some(OrderBy {
        variable: ORDER_VARIABLE.to_string(),
        direction: if descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    })
}

/// Substring rule applied to the raw question when no single keyword fired
pub struct CompoundPatternRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub pattern: SpecialPattern,
}

fn multiple_accounts(q: &str) -> bool {
    q.contains("multiple") && q.contains("account")
}

fn cross_border(q: &str) -> bool {
    (q.contains("cross") && q.contains("border")) || q.contains("currency conversion")
}

fn comparison_words(q: &str) -> bool {
    q.contains("compare") || q.contains("vs") || q.contains("versus")
}

fn chain_words(q: &str) -> bool {
    q.contains("trail") || q.contains("chain") || q.contains("linked")
}

fn both_institution_types(q: &str) -> bool {
    q.contains("both") && (q.contains("bank") || q.contains("fintech"))
}

fn foreign_words(q: &str) -> bool {
    q.contains("foreign") || q.contains("different country")
}

fn loss_words(q: &str) -> bool {
    q.contains("lost") || q.contains("loss")
}

/// Evaluated top to bottom; the first match wins
pub const COMPOUND_PATTERN_RULES: &[CompoundPatternRule] = &[
    CompoundPatternRule {
        name: "multiple_accounts",
        matches: multiple_accounts,
        pattern: SpecialPattern::HavingMultiple,
    },
    CompoundPatternRule {
        name: "cross_border",
        matches: cross_border,
        pattern: SpecialPattern::CrossBorder,
    },
    CompoundPatternRule {
        name: "comparison",
        matches: comparison_words,
        pattern: SpecialPattern::Comparison,
    },
    CompoundPatternRule {
        name: "full_chain",
        matches: chain_words,
        pattern: SpecialPattern::FullChain,
    },
    CompoundPatternRule {
        name: "both_types",
        matches: both_institution_types,
        pattern: SpecialPattern::BothTypes,
    },
    CompoundPatternRule {
        name: "foreign",
        matches: foreign_words,
        pattern: SpecialPattern::Foreign,
    },
    CompoundPatternRule {
        name: "loss",
        matches: loss_words,
        pattern: SpecialPattern::LossFilter,
    },
];

pub fn detect_special_pattern(
    text: &QuestionText,
    vocab: &OntologyVocabulary,
) -> Option<SpecialPattern> {
    if let Some(pattern) = text.words().find_map(|w| vocab.special_pattern_for(w)) {
        return Some(pattern);
    }

    COMPOUND_PATTERN_RULES
        .iter()
        .find(|rule| (rule.matches)(&text.raw))
        .map(|rule| {
            debug!("Special pattern {} via compound rule {}", rule.pattern, rule.name);
            rule.pattern
        })
}

fn parse_decimal(token: &str) -> Option<f64> {
    let cleaned = token.replace(',', "");
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn detect_comparison(text: &QuestionText, vocab: &OntologyVocabulary) -> Option<Comparison> {
    let mut comparison = Comparison::default();

    if let Some(caps) = PERCENTAGE.captures(&text.raw) {
        if let Ok(percentage) = caps[1].parse::<u32>() {
            comparison.percentage = Some(percentage);
            if loss_words(&text.raw) {
                comparison.semantic_type = Some(ComparisonSemantic::LossPercentage);
            }
        }
    }

    for (i, token) in text.tokens.iter().enumerate() {
        if let Some(operator) = vocab.comparison_for(token) {
            comparison.operator = Some(operator);
            if let Some(value) = text.tokens.get(i + 1).and_then(|next| parse_decimal(next)) {
                comparison.value = Some(value);
            }
        }
    }

    if comparison.is_empty() {
        None
    } else {
        Some(comparison)
    }
}

pub fn detect_specific_institution(
    text: &QuestionText,
    vocab: &OntologyVocabulary,
) -> Option<String> {
    vocab
        .institutions()
        .iter()
        .find(|(keyword, _)| text.raw.contains(keyword.as_str()))
        .map(|(_, institution)| institution.clone())
}
