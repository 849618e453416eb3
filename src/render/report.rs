// src/render/report.rs

use serde::{Deserialize, Serialize};

use super::{ratio, FloatFormat};
use crate::error::{EvalError, Result};
use crate::table::{Key, Table};

/// One presentation cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    /// Literal text, e.g. a note in place of a number.
    Text(String),
    Missing,
}

impl Cell {
    pub fn number(&self) -> Option<f64> {
        match *self {
            Cell::Int(v) => Some(v as f64),
            Cell::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub(crate) fn render(&self, float: FloatFormat, missing: &str) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => float.format(*v),
            Cell::Text(s) => s.clone(),
            Cell::Missing => missing.to_string(),
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Missing, Cell::Float)
    }
}

impl From<Option<u64>> for Cell {
    fn from(v: Option<u64>) -> Self {
        v.map_or(Cell::Missing, |n| Cell::Int(n as i64))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub label: String,
    pub cells: Vec<Cell>,
    /// Belongs to the group started by the nearest preceding non-continuation row.
    pub continuation: bool,
}

impl ReportRow {
    pub fn new(label: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            label: label.into(),
            cells,
            continuation: false,
        }
    }

    pub fn continuing(mut self) -> Self {
        self.continuation = true;
        self
    }
}

/// A labelled table of presentation cells; rows need not share a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Header of the label column.
    pub index: String,
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

/// A derived `round(numerator / denominator)` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSpec {
    pub label: String,
    pub numerator: String,
    pub denominator: String,
    /// Sum both operands over a row and its continuation rows.
    #[serde(default)]
    pub grouped: bool,
}

impl Report {
    pub fn new(index: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index: index.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn from_table<R: Key, C: Key>(table: &Table<R, C>, index: impl Into<String>) -> Self {
        let mut report = Self::new(
            index,
            table.columns().iter().map(ToString::to_string).collect(),
        );
        for (key, row) in table.rows().iter().zip(table.cells()) {
            report.push(ReportRow::new(
                key.to_string(),
                row.iter().copied().map(Cell::from).collect(),
            ));
        }
        report
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| EvalError::column(name))
    }

    /// A copy with `spec`'s ratio appended as the last column.
    pub fn with_ratio(&self, spec: &RatioSpec) -> Result<Self> {
        let num = self.column_index(&spec.numerator)?;
        let den = self.column_index(&spec.denominator)?;
        let operand = |row: &ReportRow, idx: usize| row.cells.get(idx).and_then(Cell::number);

        let mut out = self.clone();
        out.columns.push(spec.label.clone());
        for (i, row) in self.rows.iter().enumerate() {
            let value = if spec.grouped && !row.continuation {
                let group = self.rows[i + 1..]
                    .iter()
                    .take_while(|r| r.continuation);
                let (mut n, mut d) = (operand(row, num), operand(row, den));
                for member in group {
                    n = sum_present(n, operand(member, num));
                    d = sum_present(d, operand(member, den));
                }
                ratio(n, d)
            } else {
                ratio(operand(row, num), operand(row, den))
            };
            out.rows[i]
                .cells
                .push(value.map_or(Cell::Missing, Cell::Int));
        }
        Ok(out)
    }
}

fn sum_present(acc: Option<f64>, v: Option<f64>) -> Option<f64> {
    match (acc, v) {
        (Some(a), Some(b)) => Some(a + b),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc_report() -> Report {
        let mut r = Report::new(
            "layer",
            vec!["Lines of code".into(), "Lines of proof".into()],
        );
        r.push(ReportRow::new("circular", vec![Cell::Int(100), Cell::Int(700)]));
        r.push(ReportRow::new("wal-sts", vec![Cell::Int(200), Cell::Int(1000)]));
        r.push(ReportRow::new("wal", vec![Cell::Missing, Cell::Int(600)]).continuing());
        r.push(ReportRow::new("obj", vec![Cell::Int(15), Cell::Int(30)]));
        r
    }

    fn spec(grouped: bool) -> RatioSpec {
        RatioSpec {
            label: "Ratio".into(),
            numerator: "Lines of proof".into(),
            denominator: "Lines of code".into(),
            grouped,
        }
    }

    #[test]
    fn per_row_ratio() {
        let r = loc_report().with_ratio(&spec(false)).unwrap();
        assert_eq!(r.columns.last().map(String::as_str), Some("Ratio"));
        let ratios: Vec<_> = r.rows.iter().map(|row| row.cells[2].clone()).collect();
        assert_eq!(
            ratios,
            vec![Cell::Int(7), Cell::Int(5), Cell::Missing, Cell::Int(2)]
        );
    }

    #[test]
    fn grouped_ratio_sums_continuations() {
        let r = loc_report().with_ratio(&spec(true)).unwrap();
        // (1000 + 600) / 200
        assert_eq!(r.rows[1].cells[2], Cell::Int(8));
        assert_eq!(r.rows[2].cells[2], Cell::Missing);
        assert_eq!(r.rows[3].cells[2], Cell::Int(2));
    }

    #[test]
    fn ratio_needs_known_columns() {
        let mut s = spec(false);
        s.numerator = "Lines of Coq".into();
        assert!(matches!(
            loc_report().with_ratio(&s),
            Err(EvalError::Column { .. })
        ));
    }

    #[test]
    fn from_table_keeps_missing() {
        let t = Table::from_rows(
            vec!["linux".to_string(), "gonfs".to_string()],
            vec![("app".to_string(), vec![Some(1.5), None])],
        )
        .unwrap();
        let r = Report::from_table(&t, "bench");
        assert_eq!(r.index, "bench");
        assert_eq!(r.rows[0].label, "app");
        assert_eq!(r.rows[0].cells, vec![Cell::Float(1.5), Cell::Missing]);
    }
}
