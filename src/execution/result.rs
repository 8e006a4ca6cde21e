//! Result Table - Tabular result of one SPARQL SELECT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows returned by an endpoint. Column names are the projection variables
/// without the leading `?`; unbound cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,

    /// Wall-clock time of the request in milliseconds
    pub execution_time_ms: u64,

    pub executed_at: DateTime<Utc>,
}

impl ResultTable {
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms,
            executed_at: Utc::now(),
        }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self::new(columns, Vec::new(), 0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim_start_matches('?');
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).and_then(|c| c.as_deref()))
                .collect(),
        )
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for (column, cell) in self.columns.iter().zip(row.iter()) {
                    let value = match cell {
                        Some(s) => serde_json::Value::String(s.clone()),
                        None => serde_json::Value::Null,
                    };
                    object.insert(column.clone(), value);
                }
                serde_json::Value::Object(object)
            })
            .collect();

        serde_json::json!({
            "columns": self.columns,
            "rows": rows,
            "row_count": self.row_count(),
        })
    }
}

/// Plain-text grid, one line per row
impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.as_deref().map_or(0, |c| c.chars().count());
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(len);
                }
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c.as_deref().unwrap_or(""), width = *w))
                .collect();
            writeln!(f, "{}", cells.join(" | ").trim_end())?;
        }

        write!(f, "({} rows, {} ms)", self.row_count(), self.execution_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultTable {
        ResultTable::new(
            vec!["custName".to_string(), "NumAcc".to_string()],
            vec![
                vec![Some("Asha".to_string()), Some("2".to_string())],
                vec![Some("Ben".to_string()), None],
            ],
            12,
        )
    }

    #[test]
    fn test_column_lookup_accepts_question_mark() {
        let table = sample();
        assert_eq!(table.column_index("?NumAcc"), Some(1));
        assert_eq!(table.column("custName").unwrap(), vec![Some("Asha"), Some("Ben")]);
        assert_eq!(table.column("NumAcc").unwrap(), vec![Some("2"), None]);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_to_json_keeps_nulls() {
        let json = sample().to_json();
        assert_eq!(json["row_count"], 2);
        assert_eq!(json["rows"][0]["custName"], "Asha");
        assert!(json["rows"][1]["NumAcc"].is_null());
    }

    #[test]
    fn test_display_grid() {
        let rendered = sample().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "custName | NumAcc");
        assert_eq!(lines[2], "Asha     | 2");
        assert_eq!(lines[3], "Ben      |");
        assert_eq!(lines[4], "(2 rows, 12 ms)");
    }
}
