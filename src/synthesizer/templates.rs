//! SPARQL templates
//!
//! Each function renders one query body starting at `SELECT`; the prefix
//! declaration is added by [`super::SparqlQuery`]. Values interpolated here
//! come from the vocabulary tables only.

use crate::nl_query::{AggregateFunction, ComparisonOperator, SortDirection};
use crate::ontology::OntologyClass;

/// Renders a decimal with at least one fractional digit (`200000.0`)
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

// Special patterns

pub fn multiple_accounts() -> String {
    r#"SELECT ?custName (COUNT(?acc) AS ?NumAccounts)
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?custName ;
        cccm:hasAccount ?acc .
}
GROUP BY ?custName
HAVING(COUNT(?acc) > 1)
ORDER BY DESC(?NumAccounts)"#
        .to_string()
}

pub fn cross_border() -> String {
    r##"SELECT ?TxnID ?custName ?fromISO ?toISO
WHERE {
  ?txn a cccm:Transaction ;
       cccm:fromCurrency ?fc ;
       cccm:toCurrency ?tc ;
       cccm:initiatedBy ?cust .

  FILTER(?fc != ?tc)

  ?fc cccm:isoCode ?fromISO .
  ?tc cccm:isoCode ?toISO .
  ?cust cccm:fullName ?custName .

  BIND(STRAFTER(STR(?txn), "#") AS ?TxnID)
}
ORDER BY ?custName"##
        .to_string()
}

pub fn institution_comparison() -> String {
    r#"SELECT ?instName (COUNT(?txn) AS ?TotalTxns)
WHERE {
  ?txn cccm:processedBy ?inst .
  ?inst cccm:bankName ?instName .
}
GROUP BY ?instName
ORDER BY DESC(?TotalTxns)"#
        .to_string()
}

pub fn full_chain() -> String {
    r##"SELECT ?custName ?accID ?instName ?txnID ?amount
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?custName ;
        cccm:hasAccount ?acc .

  ?acc cccm:heldAt ?inst .
  ?inst cccm:bankName ?instName .

  ?txn cccm:initiatedBy ?cust ;
       cccm:amountSent ?amount .

  BIND(STRAFTER(STR(?acc), "#") AS ?accID)
  BIND(STRAFTER(STR(?txn), "#") AS ?txnID)
}
ORDER BY ?custName"##
        .to_string()
}

pub fn both_institution_types() -> String {
    r#"SELECT DISTINCT ?custName
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?custName ;
        cccm:hasAccount ?acc1, ?acc2 .

  ?acc1 cccm:heldAt ?inst1 .
  ?acc2 cccm:heldAt ?inst2 .

  ?inst1 a cccm:Bank .
  ?inst2 a cccm:FinTech .
}"#
    .to_string()
}

pub fn foreign_accounts() -> String {
    r#"SELECT DISTINCT ?custName ?custCountry ?bankCountry
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?custName ;
        cccm:basedIn ?cCountry ;
        cccm:hasAccount ?acc .

  ?cCountry cccm:countryName ?custCountry .

  ?acc cccm:heldAt ?inst .
  ?inst cccm:basedIn ?iCountry .
  ?iCountry cccm:countryName ?bankCountry .

  FILTER(?cCountry != ?iCountry)
}"#
    .to_string()
}

/// Transactions whose received amount fell short of the sent amount by more
/// than `percentage` percent
pub fn conversion_loss(percentage: u32) -> String {
    let threshold = format_decimal(f64::from(percentage) / 100.0);
    format!(
        r##"SELECT ?TxnID ?custName ?sent ?received
WHERE {{
  ?txn a cccm:Transaction ;
       cccm:amountSent ?sent ;
       cccm:amountReceived ?received ;
       cccm:initiatedBy ?cust .

  FILTER((?sent - ?received) > (?sent * {threshold}))
  BIND(STRAFTER(STR(?txn),"#") AS ?TxnID)
  ?cust cccm:fullName ?custName .
}}
ORDER BY DESC(?sent)"##,
        threshold = threshold
    )
}

pub fn top_spender() -> String {
    r#"SELECT ?custName (SUM(?amount) AS ?TotalSent)
WHERE {
  ?txn a cccm:Transaction ;
       cccm:amountSent ?amount ;
       cccm:initiatedBy ?cust .
  ?cust cccm:fullName ?custName .
}
GROUP BY ?custName
ORDER BY DESC(?TotalSent)
LIMIT 1"#
        .to_string()
}

pub fn top_fintech_by_remittances() -> String {
    r#"SELECT ?fintechName (COUNT(?r) AS ?NumRemittances)
WHERE {
  ?r a cccm:Remittance ;
     cccm:processedBy ?fintech .

  ?fintech a cccm:FinTech ;
           cccm:bankName ?fintechName .
}
GROUP BY ?fintechName
ORDER BY DESC(?NumRemittances)"#
        .to_string()
}

pub fn top_exchange_rates() -> String {
    r##"SELECT ?rateID ?value ?src ?tgt
WHERE {
  ?r a cccm:Rate ;
     cccm:rateValue ?value ;
     cccm:rateSource ?s ;
     cccm:rateTarget ?t .
  ?s cccm:isoCode ?src .
  ?t cccm:isoCode ?tgt .

  BIND(STRAFTER(STR(?r),"#") AS ?rateID)
}
ORDER BY DESC(?value)
LIMIT 10"##
        .to_string()
}

// Named institution and numeric threshold

pub fn institution_transactions(institution: &str) -> String {
    format!(
        r##"SELECT ?TxnID ?custName ?amount
WHERE {{
  ?txn cccm:processedBy cccm:{institution} ;
       cccm:amountSent ?amount ;
       cccm:initiatedBy ?cust .

  ?cust cccm:fullName ?custName .
  BIND(STRAFTER(STR(?txn),"#") AS ?TxnID)
}}
ORDER BY DESC(?amount)"##,
        institution = institution
    )
}

pub fn remittances_over_threshold(operator: ComparisonOperator, value: f64) -> String {
    format!(
        r#"SELECT ?custName ?amount
WHERE {{
  ?r a cccm:Remittance ;
     cccm:amountSent ?amount ;
     cccm:initiatedBy ?cust .
  FILTER(?amount {op} {value})

  ?cust cccm:fullName ?custName .
}}
ORDER BY DESC(?amount)"#,
        op = operator.symbol(),
        value = format_decimal(value)
    )
}

pub fn transactions_over_threshold(operator: ComparisonOperator, value: f64) -> String {
    format!(
        r##"SELECT ?TxnID ?amount
WHERE {{
  ?txn a cccm:Transaction ;
       cccm:amountSent ?amount .
  FILTER(?amount {op} {value})

  BIND(STRAFTER(STR(?txn),"#") AS ?TxnID)
}}
ORDER BY DESC(?amount)"##,
        op = operator.symbol(),
        value = format_decimal(value)
    )
}

// Aggregations

pub fn customers_per_bank() -> String {
    r#"SELECT ?bankName (COUNT(DISTINCT ?cust) AS ?NumCustomers)
WHERE {
  ?acc a cccm:Account ;
       cccm:heldAt ?bank .
  ?bank a cccm:Bank ;
        cccm:bankName ?bankName .
  ?cust cccm:hasAccount ?acc .
}
GROUP BY ?bankName
ORDER BY DESC(?NumCustomers)"#
        .to_string()
}

pub fn accounts_per_customer(
    function: AggregateFunction,
    variable: &str,
    direction: Option<SortDirection>,
) -> String {
    let mut query = format!(
        r#"SELECT ?custName ({function}({var}) AS ?NumAcc)
WHERE {{
  ?cust a cccm:Customer ;
        cccm:fullName ?custName ;
        cccm:hasAccount {var} .
}}
GROUP BY ?custName"#,
        function = function,
        var = variable
    );
    if let Some(direction) = direction {
        query.push_str(&format!("\nORDER BY {}(?NumAcc)", direction.as_str()));
    }
    query
}

pub fn transactions_per_currency() -> String {
    r#"SELECT ?iso (COUNT(?txn) AS ?TxnCount)
WHERE {
  ?txn cccm:fromCurrency ?cur .
  ?cur cccm:isoCode ?iso .
}
GROUP BY ?iso
ORDER BY DESC(?TxnCount)"#
        .to_string()
}

pub fn customer_total(function: AggregateFunction, country: Option<&str>) -> String {
    let country_filter = country
        .map(|c| format!("\n        cccm:basedIn cccm:{} ;", c))
        .unwrap_or_default();
    format!(
        r#"SELECT ({function}(?cust) AS ?TotalCustomers)
WHERE {{
  ?cust a cccm:Customer ;{country_filter}
        cccm:fullName ?name .
}}"#,
        function = function,
        country_filter = country_filter
    )
}

pub fn transaction_total(function: AggregateFunction) -> String {
    format!(
        r#"SELECT ({function}(?txn) AS ?TotalTransactions)
WHERE {{
  ?txn a cccm:Transaction .
}}"#,
        function = function
    )
}

pub fn generic_total(function: AggregateFunction) -> String {
    format!(
        r#"SELECT ({function}(?item) AS ?Total)
WHERE {{
  ?item a ?type .
}}"#,
        function = function
    )
}

// Transaction family

pub fn remittances_by_fintech() -> String {
    r##"SELECT (STRAFTER(STR(?r),"#") AS ?RemitID) ?custName ?amount ?fintechName
WHERE {
  ?r a cccm:Remittance ;
     cccm:amountSent ?amount ;
     cccm:initiatedBy ?cust ;
     cccm:processedBy ?fintech .

  ?cust cccm:fullName ?custName .
  ?fintech a cccm:FinTech ;
           cccm:bankName ?fintechName .
}
ORDER BY DESC(?amount)"##
        .to_string()
}

/// `txn_class` is `Remittance` or `Transaction`
pub fn initiating_customers(txn_class: OntologyClass) -> String {
    let subject = if txn_class == OntologyClass::Remittance {
        "?r a cccm:Remittance ;\n     cccm:initiatedBy ?cust ."
    } else {
        "?txn a cccm:Transaction ;\n       cccm:initiatedBy ?cust ."
    };
    format!(
        r#"SELECT DISTINCT ?custName
WHERE {{
  {subject}
  ?cust cccm:fullName ?custName .
}}"#,
        subject = subject
    )
}

pub fn processing_institutions() -> String {
    r##"SELECT ?txnID ?instName
WHERE {
  ?txn a cccm:Transaction ;
       cccm:processedBy ?inst .
  ?inst cccm:bankName ?instName .
  BIND(STRAFTER(STR(?txn), "#") AS ?txnID)
}"##
    .to_string()
}

pub fn transactions_with_status(txn_class: OntologyClass, status: &str) -> String {
    format!(
        r##"SELECT ?txnID ?amount ?status
WHERE {{
  ?txn a cccm:{class} ;
       cccm:amountSent ?amount ;
       cccm:hasStatus ?s .
  ?s cccm:status ?status .
  FILTER(?status = "{status}")
  BIND(STRAFTER(STR(?txn), "#") AS ?txnID)
}}"##,
        class = txn_class.local_name(),
        status = status
    )
}

pub fn transactions_by_currency(from: Option<&str>, to: Option<&str>) -> String {
    let mut clauses = vec![
        "?txn a cccm:Transaction ;".to_string(),
        "     cccm:amountSent ?amount .".to_string(),
    ];
    if let Some(from) = from {
        clauses.push(format!("  ?txn cccm:fromCurrency cccm:{} .", from));
    }
    if let Some(to) = to {
        clauses.push(format!("  ?txn cccm:toCurrency cccm:{} .", to));
    }
    format!(
        r##"SELECT ?txnID ?amount
WHERE {{
  {clauses}
  BIND(STRAFTER(STR(?txn), "#") AS ?txnID)
}}"##,
        clauses = clauses.join("\n")
    )
}

pub fn transaction_listing(txn_class: OntologyClass) -> String {
    format!(
        r##"SELECT ?txnID ?amount
WHERE {{
  ?txn a cccm:{class} ;
       cccm:amountSent ?amount .
  BIND(STRAFTER(STR(?txn), "#") AS ?txnID)
}}"##,
        class = txn_class.local_name()
    )
}

// Customer, institution and account families

pub fn customer_names(country: Option<&str>) -> String {
    match country {
        Some(country) => format!(
            r#"SELECT ?name
WHERE {{
  ?cust a cccm:Customer ;
        cccm:fullName ?name ;
        cccm:basedIn cccm:{country} .
}}"#,
            country = country
        ),
        None => r#"SELECT ?name
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?name .
}"#
        .to_string(),
    }
}

/// `types` holds prefixed class names such as `cccm:Bank`
pub fn institution_names(types: &[&str], country: Option<&str>) -> String {
    let type_list = types.join(", ");
    match (country, types) {
        (Some(country), _) => {
            let type_filter = if types.len() > 1 {
                format!("FILTER(?type IN ({}))", type_list)
            } else {
                String::new()
            };
            format!(
                r#"SELECT ?name
WHERE {{
  ?i a ?type ;
     cccm:basedIn cccm:{country} ;
     cccm:bankName ?name .
  {type_filter}
}}"#,
                country = country,
                type_filter = type_filter
            )
        }
        (None, [single]) => format!(
            r#"SELECT ?name
WHERE {{
  ?i a {single} ;
     cccm:bankName ?name .
}}"#,
            single = single
        ),
        (None, _) => format!(
            r#"SELECT ?name
WHERE {{
  ?i a ?type ;
     cccm:bankName ?name .
  FILTER(?type IN ({type_list}))
}}"#,
            type_list = type_list
        ),
    }
}

pub fn customer_accounts() -> String {
    r##"SELECT ?custName ?accID
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?custName ;
        cccm:hasAccount ?acc .
  BIND(STRAFTER(STR(?acc), "#") AS ?accID)
}"##
    .to_string()
}

// Fallbacks

pub fn sample_customers() -> String {
    r#"SELECT ?name
WHERE {
  ?cust a cccm:Customer ;
        cccm:fullName ?name .
}
LIMIT 10"#
        .to_string()
}

/// Name-like projection of one class: `prop` is the local name of the
/// property, `var` the projected variable
pub fn class_projection(class: OntologyClass, prop: &str, var: &str) -> String {
    format!(
        r#"SELECT {var}
WHERE {{
  ?item a cccm:{class} ;
        cccm:{prop} {var} .
}}"#,
        var = var,
        class = class.local_name(),
        prop = prop
    )
}

pub fn class_instances(class: OntologyClass) -> String {
    format!(
        r#"SELECT ?item
WHERE {{
  ?item a cccm:{class} .
}}
LIMIT 20"#,
        class = class.local_name()
    )
}
