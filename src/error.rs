use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    // Parsing
    #[error("line {line}: malformed `{field}` value {value:?} in {text:?}")]
    MalformedRecord {
        line: usize,
        text: String,
        field: &'static str,
        value: String,
    },

    // Pivot
    #[error("duplicate measurement for row `{row}`, column `{column}`: {first} vs {second}")]
    DuplicateKey {
        row: String,
        column: String,
        first: f64,
        second: f64,
    },

    #[error("column `{column}` was never observed")]
    Column { column: String },

    #[error("row `{row}` was never observed")]
    Row { row: String },

    // Render
    #[error("row {row} has {len} cells, expected {expected}")]
    Shape {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("delimited output: {0}")]
    Csv(#[from] csv::Error),

    #[error("record output: {0}")]
    Json(#[from] serde_json::Error),

    // IO / Discovery
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("glob pattern error: {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no path configured for source root `{name}`")]
    UnknownRoot { name: String },

    // Configuration
    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl EvalError {
    pub fn column(column: impl ToString) -> Self {
        Self::Column {
            column: column.to_string(),
        }
    }

    pub fn row(row: impl ToString) -> Self {
        Self::Row {
            row: row.to_string(),
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = EvalError> = std::result::Result<T, E>;
