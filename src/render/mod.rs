//! Turning tables into text: tab-separated data files, markup fragments and
//! aligned console tables.

pub mod delimited;
pub mod markup;
pub mod plain;
pub mod report;

use serde::{Deserialize, Serialize};

pub use delimited::{render_delimited, DelimitedOptions};
pub use markup::{render_markup, MarkupOptions};
pub use plain::{render_plain, PlainOptions};
pub use report::{Cell, RatioSpec, Report, ReportRow};

pub const DEFAULT_MISSING: &str = "---";

/// Written in config as `shortest` or `{fixed: N}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FloatFormatRepr", into = "FloatFormatRepr")]
pub enum FloatFormat {
    /// Shortest representation that round-trips; `10.0` prints as `10`.
    #[default]
    Shortest,
    /// Exactly this many decimals.
    Fixed(usize),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FloatFormatRepr {
    Name(String),
    Fixed { fixed: usize },
}

impl TryFrom<FloatFormatRepr> for FloatFormat {
    type Error = String;

    fn try_from(repr: FloatFormatRepr) -> Result<Self, Self::Error> {
        match repr {
            FloatFormatRepr::Name(name) if name == "shortest" => Ok(FloatFormat::Shortest),
            FloatFormatRepr::Name(name) => Err(format!(
                "unknown float format `{}`, expected `shortest` or `{{fixed: N}}`",
                name
            )),
            FloatFormatRepr::Fixed { fixed } => Ok(FloatFormat::Fixed(fixed)),
        }
    }
}

impl From<FloatFormat> for FloatFormatRepr {
    fn from(format: FloatFormat) -> Self {
        match format {
            FloatFormat::Shortest => FloatFormatRepr::Name("shortest".to_string()),
            FloatFormat::Fixed(fixed) => FloatFormatRepr::Fixed { fixed },
        }
    }
}

impl FloatFormat {
    pub fn format(&self, v: f64) -> String {
        match *self {
            FloatFormat::Shortest => v.to_string(),
            FloatFormat::Fixed(decimals) => format!("{:.*}", decimals, v),
        }
    }
}

/// `round(numerator / denominator)`, or `None` when either side is missing
/// or the denominator is zero. Halves round to even.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<i64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    Some((n / d).round_ties_even() as i64)
}
