//! Query Synthesizer
//!
//! Turns an [`NLQuery`] into SPARQL text. Dispatch is a set of ordered rule
//! lists: the first rule whose predicate holds renders the query, and a rule
//! may delegate to a nested list. Synthesis is total; the last rule of every
//! list always applies.

pub mod templates;

use crate::nl_query::{
    AggregateFunction, Aggregation, ComparisonOperator, FilterKey, NLQuery, OrderBy,
    SortDirection, SpecialPattern,
};
use crate::ontology::{prefix_declaration, OntologyClass, OntologyProperty};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::ontology::OntologyClass as C;

/// Generated SPARQL text plus the name of the template that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SparqlQuery {
    template: String,
    text: String,
}

impl SparqlQuery {
    fn new(template: String, body: String) -> Self {
        Self {
            template,
            text: format!("{}\n{}", prefix_declaration(), body),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Dotted rule path, e.g. `aggregation.accounts_per_customer`
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for SparqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl AsRef<str> for SparqlQuery {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

pub enum Render {
    Template(fn(&NLQuery) -> String),
    Cascade(&'static [Rule]),
}

pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&NLQuery) -> bool,
    pub render: Render,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

fn always(_: &NLQuery) -> bool {
    true
}

fn pattern_is(query: &NLQuery, pattern: SpecialPattern) -> bool {
    query.special_pattern == Some(pattern)
}

/// Class a transaction-shaped template binds to
fn transaction_class(query: &NLQuery) -> OntologyClass {
    if query.has_class(C::Remittance) {
        C::Remittance
    } else {
        C::Transaction
    }
}

fn aggregation_of(query: &NLQuery) -> (AggregateFunction, &str) {
    query
        .aggregation
        .as_ref()
        .map(|a| (a.function, a.target_variable.as_str()))
        .unwrap_or((AggregateFunction::Count, "?item"))
}

// Top-level dispatch

pub const DISPATCH_RULES: &[Rule] = &[
    Rule {
        name: "having_multiple",
        applies: |q| pattern_is(q, SpecialPattern::HavingMultiple),
        render: Render::Template(|_| templates::multiple_accounts()),
    },
    Rule {
        name: "cross_border",
        applies: |q| pattern_is(q, SpecialPattern::CrossBorder),
        render: Render::Template(|_| templates::cross_border()),
    },
    Rule {
        name: "comparison",
        applies: |q| pattern_is(q, SpecialPattern::Comparison),
        render: Render::Template(|_| templates::institution_comparison()),
    },
    Rule {
        name: "full_chain",
        applies: |q| pattern_is(q, SpecialPattern::FullChain),
        render: Render::Template(|_| templates::full_chain()),
    },
    Rule {
        name: "both_types",
        applies: |q| pattern_is(q, SpecialPattern::BothTypes),
        render: Render::Template(|_| templates::both_institution_types()),
    },
    Rule {
        name: "foreign",
        applies: |q| pattern_is(q, SpecialPattern::Foreign),
        render: Render::Template(|_| templates::foreign_accounts()),
    },
    Rule {
        name: "loss_filter",
        applies: |q| {
            pattern_is(q, SpecialPattern::LossFilter)
                || q.comparison.as_ref().map_or(false, |c| c.is_loss_percentage())
        },
        render: Render::Template(|q| {
            let percentage = q.comparison.as_ref().and_then(|c| c.percentage).unwrap_or(5);
            templates::conversion_loss(percentage)
        }),
    },
    Rule {
        name: "top",
        applies: |q| pattern_is(q, SpecialPattern::Top),
        render: Render::Cascade(TOP_RULES),
    },
    Rule {
        name: "specific_institution",
        applies: |q| q.specific_entity.is_some(),
        render: Render::Template(|q| {
            templates::institution_transactions(q.specific_entity.as_deref().unwrap_or_default())
        }),
    },
    Rule {
        name: "numeric_threshold",
        applies: |q| q.comparison_value().is_some(),
        render: Render::Cascade(THRESHOLD_RULES),
    },
    Rule {
        name: "aggregation",
        applies: |q| q.aggregation.is_some(),
        render: Render::Cascade(AGGREGATION_RULES),
    },
    Rule {
        name: "transaction",
        applies: |q| q.has_any_class(&[C::Transaction, C::Remittance]),
        render: Render::Cascade(TRANSACTION_RULES),
    },
    Rule {
        name: "customer",
        applies: |q| q.has_class(C::Customer),
        render: Render::Template(|q| templates::customer_names(q.filter_text(FilterKey::BasedIn))),
    },
    Rule {
        name: "institution",
        applies: |q| q.has_any_class(&[C::Bank, C::FinTech, C::Institution]),
        render: Render::Template(render_institutions),
    },
    Rule {
        name: "account",
        applies: |q| q.has_class(C::Account),
        render: Render::Template(|_| templates::customer_accounts()),
    },
    Rule {
        name: "default",
        applies: always,
        render: Render::Template(render_default),
    },
];

fn threshold_parts(query: &NLQuery) -> (ComparisonOperator, f64) {
    let operator = query
        .comparison
        .as_ref()
        .and_then(|c| c.operator)
        .unwrap_or(ComparisonOperator::GreaterThan);
    (operator, query.comparison_value().unwrap_or(0.0))
}

pub const THRESHOLD_RULES: &[Rule] = &[
    Rule {
        name: "remittance",
        applies: |q| q.has_class(C::Remittance),
        render: Render::Template(|q| {
            let (operator, value) = threshold_parts(q);
            templates::remittances_over_threshold(operator, value)
        }),
    },
    Rule {
        name: "transaction",
        applies: always,
        render: Render::Template(|q| {
            let (operator, value) = threshold_parts(q);
            templates::transactions_over_threshold(operator, value)
        }),
    },
];

pub const AGGREGATION_RULES: &[Rule] = &[
    Rule {
        name: "customers_per_bank",
        applies: |q| q.has_class(C::Bank) && q.has_class(C::Customer) && q.mentions("serve"),
        render: Render::Template(|_| templates::customers_per_bank()),
    },
    Rule {
        name: "accounts_per_customer",
        applies: |q| q.has_class(C::Account) || q.has_property(OntologyProperty::HasAccount),
        render: Render::Template(|q| {
            let (function, variable) = aggregation_of(q);
            let direction = q.order_by.as_ref().map(|o| o.direction);
            templates::accounts_per_customer(function, variable, direction)
        }),
    },
    Rule {
        name: "transactions_per_currency",
        applies: |q| q.has_class(C::Currency) && q.has_class(C::Transaction),
        render: Render::Template(|_| templates::transactions_per_currency()),
    },
    Rule {
        name: "customer_total",
        applies: |q| q.has_class(C::Customer) && !q.has_class(C::Transaction),
        render: Render::Template(|q| {
            let (function, _) = aggregation_of(q);
            templates::customer_total(function, q.filter_text(FilterKey::BasedIn))
        }),
    },
    Rule {
        name: "transaction_total",
        applies: |q| q.has_class(C::Transaction),
        render: Render::Template(|q| templates::transaction_total(aggregation_of(q).0)),
    },
    Rule {
        name: "generic_total",
        applies: always,
        render: Render::Template(|q| templates::generic_total(aggregation_of(q).0)),
    },
];

pub const TOP_RULES: &[Rule] = &[
    Rule {
        name: "top_spender",
        applies: |q| q.has_class(C::Customer) && q.has_class(C::Transaction),
        render: Render::Template(|_| templates::top_spender()),
    },
    Rule {
        name: "fintech_by_remittances",
        applies: |q| q.has_class(C::FinTech) && q.has_class(C::Remittance),
        render: Render::Template(|_| templates::top_fintech_by_remittances()),
    },
    Rule {
        name: "exchange_rates",
        applies: |q| q.has_class(C::Rate) || q.mentions("exchange"),
        render: Render::Template(|_| templates::top_exchange_rates()),
    },
    Rule {
        name: "ranked_aggregation",
        applies: always,
        render: Render::Template(render_ranked_aggregation),
    },
];

/// The aggregation cascade with filters dropped, a descending order and a
/// COUNT over `?item` when no aggregate was asked for
fn render_ranked_aggregation(query: &NLQuery) -> String {
    let ranked = NLQuery {
        filters: Default::default(),
        aggregation: Some(query.aggregation.clone().unwrap_or(Aggregation {
            function: AggregateFunction::Count,
            target_variable: "?item".to_string(),
        })),
        order_by: Some(OrderBy {
            variable: "?total".to_string(),
            direction: SortDirection::Desc,
        }),
        ..query.clone()
    };
    resolve(AGGREGATION_RULES, &ranked).1
}

pub const TRANSACTION_RULES: &[Rule] = &[
    Rule {
        name: "remittances_by_fintech",
        applies: |q| {
            q.has_class(C::Remittance)
                && q.has_class(C::FinTech)
                && q.has_property(OntologyProperty::ProcessedBy)
        },
        render: Render::Template(|_| templates::remittances_by_fintech()),
    },
    Rule {
        name: "initiating_customers",
        applies: |q| {
            q.has_property(OntologyProperty::InitiatedBy)
                || q.mentions("initiated")
                || q.has_property(OntologyProperty::FullName)
        },
        render: Render::Template(|q| templates::initiating_customers(transaction_class(q))),
    },
    Rule {
        name: "processing_institutions",
        applies: |q| q.has_property(OntologyProperty::ProcessedBy) || q.mentions("processed"),
        render: Render::Template(|_| templates::processing_institutions()),
    },
    Rule {
        name: "status",
        applies: |q| q.filter(FilterKey::Status).is_some(),
        render: Render::Template(|q| {
            let status = q
                .filter(FilterKey::Status)
                .map(|v| v.to_string())
                .unwrap_or_default();
            templates::transactions_with_status(transaction_class(q), &status)
        }),
    },
    Rule {
        name: "currency",
        applies: |q| {
            q.filter(FilterKey::FromCurrency).is_some() || q.filter(FilterKey::ToCurrency).is_some()
        },
        render: Render::Template(|q| {
            templates::transactions_by_currency(
                q.filter_text(FilterKey::FromCurrency),
                q.filter_text(FilterKey::ToCurrency),
            )
        }),
    },
    Rule {
        name: "listing",
        applies: always,
        render: Render::Template(|q| templates::transaction_listing(transaction_class(q))),
    },
];

fn render_institutions(query: &NLQuery) -> String {
    let mut types = Vec::new();
    if query.has_class(C::Bank) {
        types.push("cccm:Bank");
    }
    if query.has_class(C::FinTech) {
        types.push("cccm:FinTech");
    }
    if types.is_empty() || query.has_class(C::Institution) {
        types = vec!["cccm:Bank", "cccm:FinTech"];
    }
    templates::institution_names(&types, query.filter_text(FilterKey::BasedIn))
}

fn render_default(query: &NLQuery) -> String {
    let class = match query.detected_classes.iter().next() {
        Some(class) => *class,
        None => return templates::sample_customers(),
    };

    match class {
        C::Customer => templates::class_projection(class, "fullName", "?name"),
        C::Bank | C::FinTech | C::Institution => {
            templates::class_projection(class, "bankName", "?name")
        }
        C::Currency => templates::class_projection(class, "isoCode", "?code"),
        C::Country => templates::class_projection(class, "countryName", "?name"),
        _ => templates::class_instances(class),
    }
}

/// First rule of `rules` that applies to `query`
pub fn select_rule<'r>(rules: &'r [Rule], query: &NLQuery) -> &'r Rule {
    rules
        .iter()
        .find(|rule| (rule.applies)(query))
        .unwrap_or(&rules[rules.len() - 1])
}

/// Walks nested rule lists down to a template. Returns the dotted rule path
/// and the rendered body.
fn resolve(rules: &'static [Rule], query: &NLQuery) -> (String, String) {
    let rule = select_rule(rules, query);
    match &rule.render {
        Render::Template(render) => (rule.name.to_string(), render(query)),
        Render::Cascade(nested) => {
            let (path, body) = resolve(nested, query);
            (format!("{}.{}", rule.name, path), body)
        }
    }
}

/// Generate SPARQL for an analysed question
pub fn synthesize(query: &NLQuery) -> SparqlQuery {
    let (template, body) = resolve(DISPATCH_RULES, query);
    debug!("Synthesized query with template {}", template);
    SparqlQuery::new(template, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Extractor;
    use crate::nl_query::{Comparison, ComparisonSemantic, FilterValue};

    fn normalized(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn translate(question: &str) -> SparqlQuery {
        synthesize(&Extractor::new().extract(question))
    }

    fn with_classes(classes: &[OntologyClass]) -> NLQuery {
        NLQuery {
            detected_classes: classes.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_rule_list_ends_with_a_catch_all() {
        for rules in [
            DISPATCH_RULES,
            THRESHOLD_RULES,
            AGGREGATION_RULES,
            TOP_RULES,
            TRANSACTION_RULES,
        ] {
            let last = rules.last().unwrap();
            assert!((last.applies)(&NLQuery::default()), "{} is not total", last.name);
        }
    }

    #[test]
    fn test_output_starts_with_prefix() {
        let query = synthesize(&NLQuery::default());
        assert!(query
            .as_str()
            .starts_with("PREFIX cccm: <http://www.semanticweb.org/cccm#>\n"));
    }

    #[test]
    fn test_list_all_customers() {
        let query = translate("List all customers");
        assert_eq!(query.template(), "customer");
        assert!(normalized(query.as_str()).ends_with(
            "SELECT ?name WHERE { ?cust a cccm:Customer ; cccm:fullName ?name . }"
        ));
    }

    #[test]
    fn test_customers_in_country() {
        let query = translate("Show customers in India");
        assert!(query.as_str().contains("cccm:basedIn cccm:India"));
    }

    #[test]
    fn test_accounts_per_customer() {
        let query = translate("Show customers with total number of accounts");
        assert_eq!(query.template(), "aggregation.accounts_per_customer");
        assert!(query.as_str().contains("COUNT(?acc) AS ?NumAcc"));
        assert!(query.as_str().contains("GROUP BY ?custName"));
        assert!(!query.as_str().contains("ORDER BY"));

        let query = translate("count accounts per customer sorted desc");
        assert!(query.as_str().ends_with("ORDER BY DESC(?NumAcc)"));
    }

    #[test]
    fn test_remittances_over_threshold() {
        let query = translate("Show remittances over 200000");
        assert_eq!(query.template(), "numeric_threshold.remittance");
        assert!(query.as_str().contains("?r a cccm:Remittance"));
        assert!(query.as_str().contains("FILTER(?amount > 200000.0)"));

        let query = translate("transactions below 500");
        assert_eq!(query.template(), "numeric_threshold.transaction");
        assert!(query.as_str().contains("FILTER(?amount < 500.0)"));
    }

    #[test]
    fn test_multiple_accounts() {
        let query = translate("Show customers with multiple accounts");
        assert_eq!(query.template(), "having_multiple");
        assert!(query.as_str().contains("HAVING(COUNT(?acc) > 1)"));
    }

    #[test]
    fn test_empty_input_falls_back_to_sample_customers() {
        let query = translate("");
        assert_eq!(query.template(), "default");
        assert!(query.as_str().ends_with("LIMIT 10"));
        assert!(query.as_str().contains("?cust a cccm:Customer"));
    }

    #[test]
    fn test_special_pattern_preempts_class_dispatch() {
        let mut query = with_classes(&[C::Customer, C::Transaction, C::Account]);
        query.aggregation = Some(Aggregation {
            function: AggregateFunction::Count,
            target_variable: "?acc".to_string(),
        });
        query.specific_entity = Some("HDFC".to_string());

        for (pattern, name) in [
            (SpecialPattern::HavingMultiple, "having_multiple"),
            (SpecialPattern::CrossBorder, "cross_border"),
            (SpecialPattern::Comparison, "comparison"),
            (SpecialPattern::FullChain, "full_chain"),
            (SpecialPattern::BothTypes, "both_types"),
            (SpecialPattern::Foreign, "foreign"),
            (SpecialPattern::LossFilter, "loss_filter"),
            (SpecialPattern::Top, "top"),
        ] {
            query.special_pattern = Some(pattern);
            assert_eq!(select_rule(DISPATCH_RULES, &query).name, name);
        }
    }

    #[test]
    fn test_loss_percentage_comparison_selects_loss_template() {
        let mut query = with_classes(&[C::Transaction]);
        query.comparison = Some(Comparison {
            percentage: Some(10),
            semantic_type: Some(ComparisonSemantic::LossPercentage),
            ..Default::default()
        });
        let sparql = synthesize(&query);
        assert_eq!(sparql.template(), "loss_filter");
        assert!(sparql.as_str().contains("(?sent * 0.1)"));

        query.comparison = None;
        query.special_pattern = Some(SpecialPattern::LossFilter);
        assert!(synthesize(&query).as_str().contains("(?sent * 0.05)"));
    }

    #[test]
    fn test_top_branches() {
        let mut query = with_classes(&[C::Customer, C::Transaction]);
        query.special_pattern = Some(SpecialPattern::Top);
        assert_eq!(synthesize(&query).template(), "top.top_spender");

        let mut query = with_classes(&[C::FinTech, C::Remittance]);
        query.special_pattern = Some(SpecialPattern::Top);
        assert_eq!(synthesize(&query).template(), "top.fintech_by_remittances");

        let mut query = with_classes(&[C::Rate]);
        query.special_pattern = Some(SpecialPattern::Top);
        assert!(synthesize(&query).as_str().ends_with("LIMIT 10"));

        let mut query = with_classes(&[C::Account]);
        query.special_pattern = Some(SpecialPattern::Top);
        let sparql = synthesize(&query);
        assert_eq!(sparql.template(), "top.ranked_aggregation");
        assert!(sparql.as_str().contains("COUNT(?item) AS ?NumAcc"));
        assert!(sparql.as_str().ends_with("ORDER BY DESC(?NumAcc)"));
    }

    #[test]
    fn test_top_ignores_country_filter() {
        let mut query = with_classes(&[C::Customer]);
        query.special_pattern = Some(SpecialPattern::Top);
        query
            .filters
            .insert(FilterKey::BasedIn, FilterValue::Text("India".to_string()));
        let sparql = synthesize(&query);
        assert_eq!(sparql.template(), "top.ranked_aggregation");
        assert!(!sparql.as_str().contains("cccm:India"));
    }

    #[test]
    fn test_specific_institution() {
        let query = translate("Show transactions processed by ICICI");
        assert_eq!(query.template(), "specific_institution");
        assert!(query.as_str().contains("cccm:processedBy cccm:ICICI_Bank"));
    }

    #[test]
    fn test_aggregation_sub_rules() {
        let mut query = with_classes(&[C::Bank, C::Customer]);
        query.aggregation = Some(Aggregation {
            function: AggregateFunction::Count,
            target_variable: "?item".to_string(),
        });
        query.tokens = vec!["serve".to_string()];
        assert_eq!(select_rule(AGGREGATION_RULES, &query).name, "customers_per_bank");

        query.tokens.clear();
        assert_eq!(select_rule(AGGREGATION_RULES, &query).name, "customer_total");

        query.detected_classes = [C::Currency, C::Transaction].into_iter().collect();
        assert_eq!(select_rule(AGGREGATION_RULES, &query).name, "transactions_per_currency");

        query.detected_classes = [C::Customer, C::Transaction].into_iter().collect();
        assert_eq!(select_rule(AGGREGATION_RULES, &query).name, "transaction_total");

        query.detected_classes.clear();
        assert_eq!(select_rule(AGGREGATION_RULES, &query).name, "generic_total");
    }

    #[test]
    fn test_customer_total_with_country() {
        let query = translate("Count customers in UK");
        assert_eq!(query.template(), "aggregation.customer_total");
        assert!(query.as_str().contains("cccm:basedIn cccm:UK ;"));
        assert!(query.as_str().contains("COUNT(?cust) AS ?TotalCustomers"));
    }

    #[test]
    fn test_transaction_family() {
        assert_eq!(
            translate("List customers who initiated remittances").template(),
            "transaction.initiating_customers"
        );
        assert!(translate("List customers who initiated remittances")
            .as_str()
            .contains("?r a cccm:Remittance"));
        assert_eq!(
            translate("Show remittances processed by fintech").template(),
            "transaction.remittances_by_fintech"
        );
        assert_eq!(
            translate("Show transactions and the institutions that processed them").template(),
            "transaction.processing_institutions"
        );

        let failed = translate("List failed transactions");
        assert_eq!(failed.template(), "transaction.status");
        assert!(failed.as_str().contains("FILTER(?status = \"Failed\")"));

        let currency = translate("Show transactions from USD to INR");
        assert_eq!(currency.template(), "transaction.currency");
        assert!(currency.as_str().contains("cccm:fromCurrency cccm:INR"));
        assert!(currency.as_str().contains("cccm:toCurrency cccm:USD"));

        let listing = translate("Show all remittances");
        assert_eq!(listing.template(), "transaction.listing");
        assert!(listing.as_str().contains("?txn a cccm:Remittance"));
    }

    #[test]
    fn test_institution_family() {
        let banks = translate("List banks");
        assert_eq!(banks.template(), "institution");
        assert!(banks.as_str().contains("?i a cccm:Bank ;"));

        let all = translate("List all institutions");
        assert!(all.as_str().contains("FILTER(?type IN (cccm:Bank, cccm:FinTech))"));
    }

    #[test]
    fn test_default_projections() {
        assert!(synthesize(&with_classes(&[C::Currency]))
            .as_str()
            .contains("cccm:isoCode ?code"));
        assert!(synthesize(&with_classes(&[C::Country]))
            .as_str()
            .contains("cccm:countryName ?name"));
        assert!(synthesize(&with_classes(&[C::Status]))
            .as_str()
            .ends_with("LIMIT 20"));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let query = Extractor::new().extract("Show top customers by transaction amount");
        assert_eq!(synthesize(&query), synthesize(&query));
    }
}
