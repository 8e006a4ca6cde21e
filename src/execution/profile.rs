//! Query Profile - Characteristics of a generated query
//!
//! Parses SPARQL with `spargebra` and walks the algebra to report the shape
//! of the query before it is sent anywhere.

use crate::error::{Nl2SparqlError, Result};
use serde::{Deserialize, Serialize};
use spargebra::algebra::GraphPattern;
use spargebra::Query;

/// Query form as declared by the top-level keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryForm {
    Select,
    Construct,
    Describe,
    Ask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProfile {
    pub form: QueryForm,

    /// Projected variable names, without `?`
    pub projection: Vec<String>,

    pub distinct: bool,

    /// GROUP BY variables, without `?`
    pub group_by: Vec<String>,

    pub has_aggregates: bool,

    pub has_order_by: bool,

    pub has_filter: bool,

    pub limit: Option<usize>,

    /// Triple patterns across all basic graph patterns
    pub triple_pattern_count: usize,
}

/// Parse `sparql` and fail with [`Nl2SparqlError::InvalidQuery`] on a syntax error
pub fn parse_query(sparql: &str) -> Result<Query> {
    Query::parse(sparql, None).map_err(|e| Nl2SparqlError::InvalidQuery(e.to_string()))
}

/// Syntax check only; says nothing about whether the dataset knows the terms
pub fn validate_query(sparql: &str) -> Result<()> {
    parse_query(sparql).map(|_| ())
}

impl QueryProfile {
    fn empty(form: QueryForm) -> Self {
        Self {
            form,
            projection: Vec::new(),
            distinct: false,
            group_by: Vec::new(),
            has_aggregates: false,
            has_order_by: false,
            has_filter: false,
            limit: None,
            triple_pattern_count: 0,
        }
    }

    pub fn from_sparql(sparql: &str) -> Result<Self> {
        let query = parse_query(sparql)?;
        Ok(Self::from_query(&query))
    }

    pub fn from_query(query: &Query) -> Self {
        let (form, pattern) = match query {
            Query::Select { pattern, .. } => (QueryForm::Select, pattern),
            Query::Construct { pattern, .. } => (QueryForm::Construct, pattern),
            Query::Describe { pattern, .. } => (QueryForm::Describe, pattern),
            Query::Ask { pattern, .. } => (QueryForm::Ask, pattern),
        };
        let mut profile = Self::empty(form);
        profile.analyze(pattern);
        profile
    }

    fn analyze(&mut self, pattern: &GraphPattern) {
        match pattern {
            GraphPattern::Bgp { patterns } => {
                self.triple_pattern_count += patterns.len();
            }
            GraphPattern::Path { .. } => {
                self.triple_pattern_count += 1;
            }
            GraphPattern::Join { left, right }
            | GraphPattern::Union { left, right }
            | GraphPattern::Minus { left, right } => {
                self.analyze(left);
                self.analyze(right);
            }
            GraphPattern::LeftJoin { left, right, .. } => {
                self.analyze(left);
                self.analyze(right);
            }
            GraphPattern::Filter { inner, .. } => {
                self.has_filter = true;
                self.analyze(inner);
            }
            GraphPattern::Graph { inner, .. }
            | GraphPattern::Extend { inner, .. }
            | GraphPattern::Reduced { inner }
            | GraphPattern::Service { inner, .. } => {
                self.analyze(inner);
            }
            GraphPattern::OrderBy { inner, .. } => {
                self.has_order_by = true;
                self.analyze(inner);
            }
            GraphPattern::Project { inner, variables } => {
                // Sub-selects project too; the outermost one is the result shape
                if self.projection.is_empty() {
                    self.projection = variables.iter().map(|v| v.as_str().to_string()).collect();
                }
                self.analyze(inner);
            }
            GraphPattern::Distinct { inner } => {
                self.distinct = true;
                self.analyze(inner);
            }
            GraphPattern::Slice { inner, length, .. } => {
                if self.limit.is_none() {
                    self.limit = *length;
                }
                self.analyze(inner);
            }
            GraphPattern::Group {
                inner,
                variables,
                aggregates,
            } => {
                self.group_by = variables.iter().map(|v| v.as_str().to_string()).collect();
                self.has_aggregates |= !aggregates.is_empty();
                self.analyze(inner);
            }
            _ => {}
        }
    }
}
