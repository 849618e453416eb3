use std::collections::HashMap;

use super::{FloatFormat, RatioSpec, Report, DEFAULT_MISSING};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct PlainOptions {
    pub missing: String,
    pub float: FloatFormat,
    pub ratio: Option<RatioSpec>,
    pub renames: HashMap<String, String>,
}

impl Default for PlainOptions {
    fn default() -> Self {
        Self {
            missing: DEFAULT_MISSING.to_string(),
            float: FloatFormat::default(),
            ratio: None,
            renames: HashMap::new(),
        }
    }
}

/// Right-aligned columns under a header line, for the console.
pub fn render_plain(report: &Report, options: &PlainOptions) -> Result<String> {
    let report = match &options.ratio {
        Some(spec) => report.with_ratio(spec)?,
        None => report.clone(),
    };
    let rename = |s: &String| options.renames.get(s).unwrap_or(s).clone();

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(report.rows.len() + 1);
    let mut head = vec![rename(&report.index)];
    head.extend(report.columns.iter().map(rename));
    grid.push(head);
    for row in &report.rows {
        let mut out = vec![rename(&row.label)];
        out.extend(
            row.cells
                .iter()
                .map(|c| c.render(options.float, &options.missing)),
        );
        grid.push(out);
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..width)
        .map(|i| {
            grid.iter()
                .filter_map(|row| row.get(i))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut text = String::new();
    for row in &grid {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>w$}", cell, w = *w))
            .collect();
        text.push_str(&line.join("  "));
        text.push('\n');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Cell, ReportRow};

    #[test]
    fn aligned_columns() {
        let mut r = Report::new("Component", vec!["Lines of Coq".into()]);
        r.push(ReportRow::new("Program logic", vec![Cell::Int(1200)]));
        r.push(ReportRow::new("Total", vec![Cell::Missing]));
        let text = render_plain(&r, &PlainOptions::default()).unwrap();
        assert_eq!(
            text,
            concat!(
                "    Component  Lines of Coq\n",
                "Program logic          1200\n",
                "        Total           ---\n",
            )
        );
    }
}
