use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{EvalError, Result};

/// A rendered file waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub path: PathBuf,
    pub contents: String,
}

impl Output {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// All lines of `path`, or of standard input when `path` is `-`.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if path == Path::new("-") {
        return io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .map_err(|e| EvalError::read("<stdin>", e));
    }
    let text = fs::read_to_string(path).map_err(|e| EvalError::read(path, e))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Write every output, each through a temp file in its target directory
/// that is renamed over the destination.
pub fn write_outputs(outputs: &[Output]) -> Result<()> {
    for out in outputs {
        // 1) Make sure the target directory exists
        let dir = match out.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| EvalError::write(dir, e))?;

        // 2) Fill a temp file next to the destination
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EvalError::write(dir, e))?;
        tmp.write_all(out.contents.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| EvalError::write(tmp.path(), e))?;

        // 3) Rename over the original
        tmp.persist(&out.path)
            .map_err(|e| EvalError::write(&out.path, e.error))?;
        debug!(path = %out.path.display(), bytes = out.contents.len(), "wrote output");
    }
    info!(files = outputs.len(), "outputs written");
    Ok(())
}
