// src/config.rs

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{EvalError, Result};
use crate::loc::{LocTable, Roots};
use crate::parse::MalformedPolicy;
use crate::record::BenchKind;
use crate::render::FloatFormat;
use crate::table::DuplicatePolicy;

const DEFAULT_CONFIG: &str = include_str!("../assets/default.yaml");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    /// Directory the `.data` files land in unless `-o` says otherwise.
    pub output_dir: PathBuf,
    pub float_format: FloatFormat,
    pub on_malformed: MalformedPolicy,
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub renames: HashMap<String, String>,
    pub scale: ScaleConfig,
    pub bench: BenchConfig,
    #[serde(default)]
    pub roots: Roots,
    pub loc: LocConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScaleConfig {
    pub series: Vec<SeriesFile>,
}

/// One series of the scalability pivot and the file it is written to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesFile {
    pub column: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchConfig {
    pub file: String,
    pub largefile_file: String,
    pub rows: Vec<BenchKind>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub extra_columns: Vec<ExtraColumns>,
}

/// Columns appended to the bench table only when `when` was observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtraColumns {
    pub when: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocConfig {
    pub tables: Vec<LocTable>,
}

impl EvalConfig {
    /// The embedded defaults, optionally overlaid with the YAML file at `path`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builtin = Path::new("<builtin>");
        let mut merged: Value = serde_yaml::from_str(DEFAULT_CONFIG)
            .map_err(|source| EvalError::Config {
                path: builtin.to_path_buf(),
                source,
            })?;

        if let Some(path) = path {
            let text = fs::read_to_string(path).map_err(|e| EvalError::read(path, e))?;
            let overlay: Value =
                serde_yaml::from_str(&text).map_err(|source| EvalError::Config {
                    path: path.to_path_buf(),
                    source,
                })?;
            overlay_value(&mut merged, overlay);
            debug!(path = %path.display(), "loaded config overrides");
        }

        serde_yaml::from_value(merged).map_err(|source| EvalError::Config {
            path: path.unwrap_or(builtin).to_path_buf(),
            source,
        })
    }

    /// Add `name=path` source roots, replacing configured ones of the same name.
    pub fn with_roots(mut self, roots: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        self.roots.extend(roots);
        self
    }
}

/// Mappings merge key by key; anything else in `overlay` replaces `base`.
fn overlay_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => overlay_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}
