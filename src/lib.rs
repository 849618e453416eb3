pub mod classify;
pub mod config;
pub mod error;
pub mod latency;
pub mod loc;
pub mod output;
pub mod parse;
pub mod record;
pub mod render;
pub mod reports;
pub mod table;

pub use classify::{Classifier, Preset, Rule, TaggedMatch};
pub use config::EvalConfig;
pub use error::{EvalError, Result};
pub use parse::{parse, MalformedPolicy, ParseOptions, ParseOutput};
pub use record::{BenchKind, Measurement, Record};
pub use table::{pivot, AxisOrder, DuplicatePolicy, FillPolicy, PivotOptions, Table};
