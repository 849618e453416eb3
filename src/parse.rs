// src/parse.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::classify::{Classifier, TaggedMatch};
use crate::error::{EvalError, Result};
use crate::record::Record;

/// What to do with a line that matched a data shape but carried bad numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Abort the pass with `EvalError::MalformedRecord`.
    #[default]
    Fail,
    /// Report the line as a diagnostic and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub on_malformed: MalformedPolicy,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub records: Vec<Record>,
    /// Unrecognized lines, verbatim, in input order.
    pub diagnostics: Vec<String>,
}

/// Accumulator threaded through one pass.
#[derive(Default)]
struct Pass {
    series: Option<String>,
    out: ParseOutput,
}

impl Pass {
    fn step(
        mut self,
        classifier: &Classifier,
        options: ParseOptions,
        line_no: usize,
        raw: &str,
    ) -> Result<Self> {
        let line = raw.trim_end_matches(['\r', '\n']);
        match classifier.classify(line) {
            Ok(Some(TaggedMatch::Comment)) => {}
            Ok(Some(TaggedMatch::Marker(label))) => {
                trace!(line = line_no, series = %label, "series marker");
                self.series = Some(label);
            }
            Ok(Some(TaggedMatch::Data(measurement))) => self.out.records.push(Record {
                series: self.series.clone(),
                line: line_no,
                measurement,
            }),
            Ok(None) => self.out.diagnostics.push(line.to_string()),
            Err(err) => match options.on_malformed {
                MalformedPolicy::Fail => {
                    return Err(EvalError::MalformedRecord {
                        line: line_no,
                        text: line.to_string(),
                        field: err.field,
                        value: err.text,
                    })
                }
                MalformedPolicy::Skip => self.out.diagnostics.push(line.to_string()),
            },
        }
        Ok(self)
    }
}

/// Run one pass of `classifier` over `lines`.
///
/// Section markers set the series label for every following data line until
/// the next marker. Unrecognized lines end up in `diagnostics`; a malformed
/// data line fails the whole pass unless `options` says to skip it.
#[instrument(level = "debug", skip_all)]
pub fn parse<I, S>(classifier: &Classifier, lines: I, options: ParseOptions) -> Result<ParseOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pass = lines
        .into_iter()
        .enumerate()
        .try_fold(Pass::default(), |pass, (idx, line)| {
            pass.step(classifier, options, idx + 1, line.as_ref())
        })?;

    debug!(
        records = pass.out.records.len(),
        diagnostics = pass.out.diagnostics.len(),
        last_series = ?pass.series,
        "parse finished"
    );
    Ok(pass.out)
}
