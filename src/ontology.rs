//! CCCM Ontology Surface
//!
//! Classes and properties the query templates are allowed to reference.
//! These names must match the knowledge base verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace every generated query binds to the `cccm` prefix
pub const CCCM_NAMESPACE: &str = "http://www.semanticweb.org/cccm#";

/// Prefix label used in generated queries
pub const CCCM_PREFIX: &str = "cccm";

/// Prologue that starts every generated query
pub fn prefix_declaration() -> String {
    format!("PREFIX {}: <{}>\n", CCCM_PREFIX, CCCM_NAMESPACE)
}

/// Ontology classes. Declaration order is the canonical order used when a
/// template has to pick "the first" detected class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OntologyClass {
    Customer,
    Transaction,
    Remittance,
    Account,
    Bank,
    FinTech,
    Institution,
    Currency,
    Country,
    Rate,
    Status,
}

impl OntologyClass {
    pub const ALL: [OntologyClass; 11] = [
        OntologyClass::Customer,
        OntologyClass::Transaction,
        OntologyClass::Remittance,
        OntologyClass::Account,
        OntologyClass::Bank,
        OntologyClass::FinTech,
        OntologyClass::Institution,
        OntologyClass::Currency,
        OntologyClass::Country,
        OntologyClass::Rate,
        OntologyClass::Status,
    ];

    pub fn local_name(&self) -> &'static str {
        match self {
            OntologyClass::Customer => "Customer",
            OntologyClass::Transaction => "Transaction",
            OntologyClass::Remittance => "Remittance",
            OntologyClass::Account => "Account",
            OntologyClass::Bank => "Bank",
            OntologyClass::FinTech => "FinTech",
            OntologyClass::Institution => "Institution",
            OntologyClass::Currency => "Currency",
            OntologyClass::Country => "Country",
            OntologyClass::Rate => "Rate",
            OntologyClass::Status => "Status",
        }
    }
}

impl fmt::Display for OntologyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local_name())
    }
}

impl FromStr for OntologyClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OntologyClass::ALL
            .iter()
            .copied()
            .find(|c| c.local_name() == s)
            .ok_or_else(|| format!("Unknown ontology class: {}", s))
    }
}

/// Ontology properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OntologyProperty {
    FullName,
    BasedIn,
    AmountSent,
    AmountReceived,
    InitiatedBy,
    ProcessedBy,
    HasAccount,
    Balance,
    HasStatus,
    BankName,
    FromCurrency,
    ToCurrency,
    AppliedRate,
    IsoCode,
    CountryName,
    HeldAt,
    RateValue,
    RateSource,
    RateTarget,
}

impl OntologyProperty {
    pub const ALL: [OntologyProperty; 19] = [
        OntologyProperty::FullName,
        OntologyProperty::BasedIn,
        OntologyProperty::AmountSent,
        OntologyProperty::AmountReceived,
        OntologyProperty::InitiatedBy,
        OntologyProperty::ProcessedBy,
        OntologyProperty::HasAccount,
        OntologyProperty::Balance,
        OntologyProperty::HasStatus,
        OntologyProperty::BankName,
        OntologyProperty::FromCurrency,
        OntologyProperty::ToCurrency,
        OntologyProperty::AppliedRate,
        OntologyProperty::IsoCode,
        OntologyProperty::CountryName,
        OntologyProperty::HeldAt,
        OntologyProperty::RateValue,
        OntologyProperty::RateSource,
        OntologyProperty::RateTarget,
    ];

    pub fn local_name(&self) -> &'static str {
        match self {
            OntologyProperty::FullName => "fullName",
            OntologyProperty::BasedIn => "basedIn",
            OntologyProperty::AmountSent => "amountSent",
            OntologyProperty::AmountReceived => "amountReceived",
            OntologyProperty::InitiatedBy => "initiatedBy",
            OntologyProperty::ProcessedBy => "processedBy",
            OntologyProperty::HasAccount => "hasAccount",
            OntologyProperty::Balance => "balance",
            OntologyProperty::HasStatus => "hasStatus",
            OntologyProperty::BankName => "bankName",
            OntologyProperty::FromCurrency => "fromCurrency",
            OntologyProperty::ToCurrency => "toCurrency",
            OntologyProperty::AppliedRate => "appliedRate",
            OntologyProperty::IsoCode => "isoCode",
            OntologyProperty::CountryName => "countryName",
            OntologyProperty::HeldAt => "heldAt",
            OntologyProperty::RateValue => "rateValue",
            OntologyProperty::RateSource => "rateSource",
            OntologyProperty::RateTarget => "rateTarget",
        }
    }
}

impl fmt::Display for OntologyProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local_name())
    }
}

impl FromStr for OntologyProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OntologyProperty::ALL
            .iter()
            .copied()
            .find(|p| p.local_name() == s)
            .ok_or_else(|| format!("Unknown ontology property: {}", s))
    }
}
