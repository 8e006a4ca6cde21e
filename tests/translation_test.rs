use nl2sparql::execution::{QueryForm, QueryProfile};
use nl2sparql::nl_query::{AggregateFunction, FilterKey, SpecialPattern};
use nl2sparql::ontology::OntologyClass;
use nl2sparql::token::{PosTag, Token, TokenSource};
use nl2sparql::vocabulary::VocabularyOverrides;
use nl2sparql::{synthesize, Extractor, OntologyVocabulary, Translator, EXAMPLE_QUESTIONS};
use std::sync::Arc;

fn normalized(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_every_example_question_yields_valid_sparql() {
    let translator = Translator::default();
    for question in EXAMPLE_QUESTIONS {
        let translation = translator.translate(question);
        let profile = QueryProfile::from_sparql(translation.sparql.as_str()).unwrap_or_else(|e| {
            panic!(
                "{:?} produced invalid SPARQL via {}: {}\n{}",
                question,
                translation.sparql.template(),
                e,
                translation.sparql
            )
        });
        assert_eq!(profile.form, QueryForm::Select);
        assert!(!profile.projection.is_empty(), "{:?} projects nothing", question);
    }
}

#[test]
fn test_unusual_inputs_still_yield_valid_sparql() {
    let translator = Translator::default();
    for question in [
        "",
        "???",
        "%%% 100%",
        "Show banks in UK",
        "Show fintechs and banks in India",
        "List completed remittances",
        "Show transactions to GBP",
        "average balance of accounts",
        "maximum transfers",
        "Count transactions by currency",
        "Which banks serve the most customers",
        "How many banks serve customers",
        "List rates",
        "Show countries",
        "List remittances under 1,000.50",
        "transactions with amount equal 99999999999999999999",
    ] {
        let sparql = translator.translate(question).sparql;
        assert!(
            QueryProfile::from_sparql(sparql.as_str()).is_ok(),
            "{:?} produced invalid SPARQL:\n{}",
            question,
            sparql
        );
    }
}

#[test]
fn test_scenarios() {
    let extractor = Extractor::new();

    let query = extractor.extract("List all customers");
    assert_eq!(
        query.detected_classes.iter().copied().collect::<Vec<_>>(),
        vec![OntologyClass::Customer]
    );
    assert!(query.filters.is_empty());
    assert!(normalized(synthesize(&query).as_str())
        .ends_with("SELECT ?name WHERE { ?cust a cccm:Customer ; cccm:fullName ?name . }"));

    let query = extractor.extract("Show customers in India");
    assert_eq!(query.filter_text(FilterKey::BasedIn), Some("India"));
    assert!(synthesize(&query).as_str().contains("cccm:basedIn cccm:India"));

    let query = extractor.extract("Show customers with total number of accounts");
    let aggregation = query.aggregation.clone().unwrap();
    assert_eq!(aggregation.function, AggregateFunction::Count);
    assert_eq!(aggregation.target_variable, "?acc");
    let sparql = synthesize(&query);
    assert!(sparql.as_str().contains("COUNT(?acc) AS ?NumAcc"));
    assert!(sparql.as_str().contains("GROUP BY ?custName"));

    let query = extractor.extract("Show remittances over 200000");
    assert_eq!(query.comparison_value(), Some(200000.0));
    assert!(synthesize(&query).as_str().contains("?amount > 200000.0"));

    let query = extractor.extract("Show customers with multiple accounts");
    assert_eq!(query.special_pattern, Some(SpecialPattern::HavingMultiple));
    assert!(synthesize(&query).as_str().contains("HAVING(COUNT(?acc) > 1)"));

    let query = extractor.extract("");
    assert!(query.detected_classes.is_empty());
    let sparql = synthesize(&query);
    assert!(sparql.as_str().contains("cccm:Customer"));
    assert!(sparql.as_str().ends_with("LIMIT 10"));
}

#[test]
fn test_country_detection_ignores_case() {
    let extractor = Extractor::new();
    let upper = extractor.extract("Show customers in India");
    let lower = extractor.extract("show customers in india");
    assert_eq!(upper.filter_text(FilterKey::BasedIn), Some("India"));
    assert_eq!(lower.filter_text(FilterKey::BasedIn), Some("India"));
    assert_eq!(synthesize(&upper), synthesize(&lower));
}

#[test]
fn test_entity_name_needs_capitalised_run() {
    let extractor = Extractor::new();
    assert_eq!(
        extractor.extract("Show customers in India").filter_text(FilterKey::EntityName),
        Some("India")
    );
    assert_eq!(
        extractor.extract("show customers in india").filter_text(FilterKey::EntityName),
        None
    );
}

#[test]
fn test_non_ascii_input_is_extracted() {
    let translator = Translator::default();
    for question in [
        "Show ぁing customers",
        "List ぁぁed transactions",
        "Zeige Überweisungen über 500",
    ] {
        let sparql = translator.translate(question).sparql;
        assert!(
            QueryProfile::from_sparql(sparql.as_str()).is_ok(),
            "{:?}\n{}",
            question,
            sparql
        );
    }
    let query = Extractor::new().extract("Show ぁing customers");
    assert!(query.has_class(OntologyClass::Customer));
}

#[test]
fn test_special_pattern_wins_over_classes() {
    let extractor = Extractor::new();
    let query = extractor.extract("Compare transactions of customers vs banks");
    assert!(query.has_class(OntologyClass::Customer));
    assert!(query.has_class(OntologyClass::Transaction));
    assert_eq!(synthesize(&query).template(), "comparison");
}

#[test]
fn test_vocabulary_overrides_flow_into_queries() {
    let overrides = VocabularyOverrides::from_json(
        r#"{ "classes": { "client": "Customer" }, "countries": { "pak": "Pakistan" } }"#,
    )
    .unwrap();
    let vocabulary = Arc::new(OntologyVocabulary::with_overrides(&overrides).unwrap());
    let translator = Translator::new(Extractor::with_vocabulary(vocabulary));

    let translation = translator.translate("List clients in pak");
    assert_eq!(translation.sparql.template(), "customer");
    assert!(translation.sparql.as_str().contains("cccm:basedIn cccm:Pakistan"));
}

/// Whitespace tokenizer that tags every word as a noun
struct WhitespaceTokens;

impl TokenSource for WhitespaceTokens {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        text.split_whitespace()
            .map(|word| Token {
                text: word.to_string(),
                lemma: word.to_lowercase(),
                pos: PosTag::Noun,
                is_punct: false,
                is_stop: false,
                like_num: word.chars().all(|c| c.is_ascii_digit()),
                is_proper: false,
            })
            .collect()
    }
}

#[test]
fn test_custom_token_source() {
    let extractor = Extractor::new().with_token_source(Arc::new(WhitespaceTokens));
    let query = extractor.extract("customers aged 30");
    assert_eq!(query.tokens, vec!["customers", "aged", "30"]);
    // no lemmatisation: only the surface form matches
    assert!(query.has_class(OntologyClass::Customer));
    assert_eq!(query.filter(FilterKey::Age).map(|v| v.to_string()).as_deref(), Some("30"));
}

#[test]
fn test_translation_serializes() {
    let translation = Translator::default().translate("Show customers in India");
    let json = serde_json::to_value(&translation).unwrap();
    assert_eq!(json["question"], "Show customers in India");
    assert_eq!(json["nl_query"]["filters"]["basedIn"], "India");
    assert_eq!(json["nl_query"]["intent"], "list");
    assert_eq!(json["sparql"]["template"], "customer");
    assert!(json["sparql"]["text"].as_str().unwrap().starts_with("PREFIX cccm:"));
}
