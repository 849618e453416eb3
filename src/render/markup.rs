// src/render/markup.rs

use std::collections::HashMap;
use tracing::instrument;

use super::{FloatFormat, RatioSpec, Report, DEFAULT_MISSING};
use crate::error::{EvalError, Result};

#[derive(Debug, Clone)]
pub struct MarkupOptions {
    /// Printed wherever a cell has no value.
    pub missing: String,
    pub float: FloatFormat,
    pub ratio: Option<RatioSpec>,
    /// Column whose cells span their following continuation rows.
    pub merge: Option<String>,
    /// Wrap all-lower-case labels in `\textsc{..}`.
    pub small_caps: bool,
    /// Column name → macro, e.g. `loc` renders `\loc{120}`.
    pub wrap: HashMap<String, String>,
    /// Source label → display text; replaces the label verbatim.
    pub renames: HashMap<String, String>,
    /// Emit the column names as a first row.
    pub header: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            missing: DEFAULT_MISSING.to_string(),
            float: FloatFormat::default(),
            ratio: None,
            merge: None,
            small_caps: false,
            wrap: HashMap::new(),
            renames: HashMap::new(),
            header: false,
        }
    }
}

/// True when `s` has a cased character and none of them is upper-case.
fn is_lower(s: &str) -> bool {
    s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase)
}

fn label(text: &str, options: &MarkupOptions) -> String {
    if let Some(display) = options.renames.get(text) {
        return display.clone();
    }
    if options.small_caps && is_lower(text) {
        format!("\\textsc{{{}}}", text)
    } else {
        text.to_string()
    }
}

/// Render `report` as `a & b & c` rows separated by ` \\` line breaks.
#[instrument(level = "debug", skip_all, fields(rows = report.rows.len()))]
pub fn render_markup(report: &Report, options: &MarkupOptions) -> Result<String> {
    let report = match &options.ratio {
        Some(spec) => report.with_ratio(spec)?,
        None => report.clone(),
    };
    let merge = options
        .merge
        .as_deref()
        .map(|name| report.column_index(name))
        .transpose()?;
    let wraps: Vec<Option<&String>> = report
        .columns
        .iter()
        .map(|c| options.wrap.get(c))
        .collect();

    let mut grid: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            let mut out = Vec::with_capacity(row.cells.len() + 1);
            out.push(label(&row.label, options));
            for (idx, cell) in row.cells.iter().enumerate() {
                let text = cell.render(options.float, &options.missing);
                out.push(match wraps.get(idx).copied().flatten() {
                    Some(mac) if !cell.is_missing() => format!("\\{}{{{}}}", mac, text),
                    _ => text,
                });
            }
            out
        })
        .collect();

    if let Some(col) = merge {
        merge_continuations(&report, &mut grid, col, &options.missing)?;
    }

    let mut lines: Vec<String> = Vec::with_capacity(grid.len() + 1);
    if options.header {
        let rename = |c: &String| options.renames.get(c).unwrap_or(c).clone();
        let mut head = vec![rename(&report.index)];
        head.extend(report.columns.iter().map(rename));
        lines.push(head.join(" & "));
    }
    lines.extend(grid.into_iter().map(|row| row.join(" & ")));

    let mut text = lines.join(" \\\\ \n");
    text.push('\n');
    Ok(text)
}

/// Fold each run of continuation rows into a `\multirow` cell on the row that
/// starts the run, as long as the continuation has no value of its own.
fn merge_continuations(
    report: &Report,
    grid: &mut [Vec<String>],
    col: usize,
    missing: &str,
) -> Result<()> {
    // grid cells are shifted one to the right by the label
    let g = col + 1;
    let mut i = 0;
    while i < report.rows.len() {
        let head = &report.rows[i];
        let mut span = 1;
        while let Some(next) = report.rows.get(i + span).filter(|r| r.continuation) {
            if next.cells.len() != head.cells.len() {
                return Err(EvalError::Shape {
                    row: i + span,
                    len: next.cells.len(),
                    expected: head.cells.len(),
                });
            }
            let same = grid[i + span].get(g) == grid[i].get(g);
            let empty = next.cells.get(col).map_or(true, |c| c.is_missing());
            if !(same || empty) {
                break;
            }
            span += 1;
        }
        if span > 1 {
            let text = grid[i].get(g).cloned().unwrap_or_else(|| missing.to_string());
            if let Some(cell) = grid[i].get_mut(g) {
                *cell = format!("\\multirow{{{}}}{{*}}{{{}}}", span, text);
            }
            for row in &mut grid[i + 1..i + span] {
                if let Some(cell) = row.get_mut(g) {
                    cell.clear();
                }
            }
        }
        i += span;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Cell, ReportRow};

    fn impl_report() -> Report {
        let mut r = Report::new(
            "layer",
            vec!["Lines of code".into(), "Lines of proof".into()],
        );
        r.push(ReportRow::new("circular", vec![Cell::Int(100), Cell::Int(700)]));
        r.push(ReportRow::new("wal-sts", vec![Cell::Int(200), Cell::Int(1000)]));
        r.push(ReportRow::new("wal", vec![Cell::Missing, Cell::Int(600)]).continuing());
        r.push(ReportRow::new("Misc.", vec![Cell::Int(15), Cell::Int(30)]));
        r.push(ReportRow::new(
            "GoNFS",
            vec![Cell::Int(3000), Cell::Text("Not verified".into())],
        ));
        r
    }

    fn impl_options() -> MarkupOptions {
        MarkupOptions {
            ratio: Some(RatioSpec {
                label: "Ratio".into(),
                numerator: "Lines of proof".into(),
                denominator: "Lines of code".into(),
                grouped: true,
            }),
            merge: Some("Ratio".into()),
            small_caps: true,
            ..Default::default()
        }
    }

    #[test]
    fn impl_table_fragment() {
        let text = render_markup(&impl_report(), &impl_options()).unwrap();
        let expected = concat!(
            "\\textsc{circular} & 100 & 700 & 7 \\\\ \n",
            "\\textsc{wal-sts} & 200 & 1000 & \\multirow{2}{*}{8} \\\\ \n",
            "\\textsc{wal} & --- & 600 &  \\\\ \n",
            "Misc. & 15 & 30 & 2 \\\\ \n",
            "GoNFS & 3000 & Not verified & ---\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn continuation_with_its_own_value_is_not_merged() {
        let mut r = impl_report();
        r.rows[2].cells[0] = Cell::Int(100);
        let mut options = impl_options();
        options.ratio.as_mut().unwrap().grouped = false;
        let text = render_markup(&r, &options).unwrap();
        assert!(!text.contains("multirow"));
        assert!(text.contains("\\textsc{wal} & 100 & 600 & 6"));
    }

    #[test]
    fn merge_requires_matching_shape() {
        let mut r = impl_report();
        r.rows[2].cells.push(Cell::Int(1));
        let err = render_markup(&r, &impl_options()).unwrap_err();
        assert!(matches!(err, EvalError::Shape { row: 2, .. }));
    }

    #[test]
    fn wrap_rename_and_missing_literal() {
        let mut r = Report::new("Component", vec!["Lines of Coq".into()]);
        r.push(ReportRow::new("Ghost state", vec![Cell::Int(2500)]));
        r.push(ReportRow::new("gonfs", vec![Cell::Missing]));
        let options = MarkupOptions {
            missing: "n/a".into(),
            small_caps: true,
            wrap: HashMap::from([("Lines of Coq".to_string(), "loc".to_string())]),
            renames: HashMap::from([("gonfs".to_string(), "GoNFS".to_string())]),
            header: true,
            ..Default::default()
        };
        let text = render_markup(&r, &options).unwrap();
        assert_eq!(
            text,
            "Component & Lines of Coq \\\\ \nGhost state & \\loc{2500} \\\\ \nGoNFS & n/a\n"
        );
    }

    #[test]
    fn lower_case_detection() {
        assert!(is_lower("wal-sts"));
        assert!(is_lower("jrnl"));
        assert!(!is_lower("Misc."));
        assert!(!is_lower("GoJournal total"));
        assert!(!is_lower("123"));
    }
}
