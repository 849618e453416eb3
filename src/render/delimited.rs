// src/render/delimited.rs

use csv::{QuoteStyle, WriterBuilder};
use tracing::instrument;

use super::FloatFormat;
use crate::error::{EvalError, Result};
use crate::table::{Key, Table};

#[derive(Debug, Clone)]
pub struct DelimitedOptions<C> {
    /// Write only these columns, in this order; all must exist in the table.
    pub columns: Option<Vec<C>>,
    /// Label of the row-key column; `Some` emits a header line.
    pub header: Option<String>,
    pub float: FloatFormat,
}

impl<C> Default for DelimitedOptions<C> {
    fn default() -> Self {
        Self {
            columns: None,
            header: None,
            float: FloatFormat::default(),
        }
    }
}

/// One tab-separated line per row: the row key, then one field per column.
/// Missing values are empty fields.
#[instrument(level = "debug", skip_all, fields(rows = table.rows().len()))]
pub fn render_delimited<R: Key, C: Key>(
    table: &Table<R, C>,
    options: &DelimitedOptions<C>,
) -> Result<String> {
    let selected;
    let table = match &options.columns {
        Some(columns) => {
            selected = table.select_columns(columns)?;
            &selected
        }
        None => table,
    };

    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Necessary)
        .has_headers(false)
        .from_writer(Vec::new());

    if let Some(index) = &options.header {
        let mut head = vec![index.clone()];
        head.extend(table.columns().iter().map(ToString::to_string));
        wtr.write_record(&head)?;
    }
    for (key, row) in table.rows().iter().zip(table.cells()) {
        let mut fields = Vec::with_capacity(row.len() + 1);
        fields.push(key.to_string());
        fields.extend(
            row.iter()
                .map(|v| v.map(|v| options.float.format(v)).unwrap_or_default()),
        );
        wtr.write_record(&fields)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| EvalError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
