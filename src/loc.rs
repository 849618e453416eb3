//! Lines-of-code tables for source trees, laid out from configuration.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, trace};

use crate::error::{EvalError, Result};
use crate::render::{Cell, MarkupOptions, PlainOptions, RatioSpec, Report, ReportRow};

/// Named checkouts that patterns are resolved against.
pub type Roots = BTreeMap<String, PathBuf>;

/// Files under one root: everything matching `include` that matches no `exclude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub root: String,
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocRow {
    pub label: String,
    #[serde(default)]
    pub code: Vec<Source>,
    #[serde(default)]
    pub proof: Vec<Source>,
    #[serde(default)]
    pub continuation: bool,
    /// Sums every row above it, back to the previous total.
    #[serde(default)]
    pub total: bool,
    /// Shown in place of the proof count.
    #[serde(default)]
    pub proof_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocLayout {
    /// Component and proof lines only.
    Proof,
    /// Code, proof and their ratio.
    CodeProof,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocTable {
    pub name: String,
    /// Output file name for the markup fragment.
    pub file: String,
    pub index: String,
    pub layout: LocLayout,
    pub rows: Vec<LocRow>,
}

const CODE: &str = "Lines of code";
const PROOF: &str = "Lines of proof";
const COQ: &str = "Lines of Coq";
const RATIO: &str = "Ratio";

/// Number of lines in a file; a final line without a newline still counts.
pub fn count_lines(path: &Path) -> Result<u64> {
    let bytes = fs::read(path).map_err(|e| EvalError::read(path, e))?;
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count() as u64;
    let partial = matches!(bytes.last(), Some(&b) if b != b'\n');
    Ok(newlines + u64::from(partial))
}

fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = root.join(pattern).to_string_lossy().into_owned();
    let paths = glob::glob(&full).map_err(|source| EvalError::Glob {
        pattern: full.clone(),
        source,
    })?;
    paths
        .map(|entry| {
            entry.map_err(|e| {
                let path = e.path().to_path_buf();
                EvalError::read(path, std::io::Error::from(e))
            })
        })
        .filter(|entry| entry.as_ref().map_or(true, |p| p.is_file()))
        .collect()
}

/// All files selected by `sources`, deduplicated.
pub fn resolve(sources: &[Source], roots: &Roots) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    for source in sources {
        let root = roots.get(&source.root).ok_or_else(|| EvalError::UnknownRoot {
            name: source.root.clone(),
        })?;
        let mut included = BTreeSet::new();
        for pattern in &source.include {
            included.extend(expand(root, pattern)?);
        }
        for pattern in &source.exclude {
            for path in expand(root, pattern)? {
                included.remove(&path);
            }
        }
        trace!(root = %source.root, files = included.len(), "resolved source");
        files.extend(included);
    }
    Ok(files)
}

/// Total lines across `sources`, or `None` when no sources are given.
pub fn count_sources(sources: &[Source], roots: &Roots) -> Result<Option<u64>> {
    if sources.is_empty() {
        return Ok(None);
    }
    let files: Vec<PathBuf> = resolve(sources, roots)?.into_iter().collect();
    let total = files
        .par_iter()
        .map(|p| count_lines(p))
        .try_reduce(|| 0, |a, b| Ok(a + b))?;
    Ok(Some(total))
}

fn sum_present(values: impl Iterator<Item = Option<u64>>) -> Option<u64> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0) + v))
}

impl LocTable {
    /// Count every row, filling total rows from the rows above them.
    #[instrument(level = "info", skip_all, fields(table = %self.name))]
    pub fn report(&self, roots: &Roots) -> Result<Report> {
        let mut counted: Vec<(Option<u64>, Option<u64>)> = Vec::with_capacity(self.rows.len());
        let mut group_start = 0;
        for (i, row) in self.rows.iter().enumerate() {
            if row.total {
                let group = &counted[group_start..i];
                let code = sum_present(group.iter().map(|c| c.0));
                let proof = sum_present(group.iter().map(|c| c.1));
                counted.push((code, proof));
                group_start = i + 1;
            } else {
                counted.push((
                    count_sources(&row.code, roots)?,
                    count_sources(&row.proof, roots)?,
                ));
            }
            debug!(row = %row.label, code = ?counted[i].0, proof = ?counted[i].1, "counted");
        }

        let columns = match self.layout {
            LocLayout::Proof => vec![COQ.to_string()],
            LocLayout::CodeProof => vec![CODE.to_string(), PROOF.to_string()],
        };
        let mut report = Report::new(self.index.clone(), columns);
        for (row, (code, proof)) in self.rows.iter().zip(counted) {
            let proof = match &row.proof_note {
                Some(note) => Cell::Text(note.clone()),
                None => Cell::from(proof),
            };
            let cells = match self.layout {
                LocLayout::Proof => vec![proof],
                LocLayout::CodeProof => vec![Cell::from(code), proof],
            };
            let mut out = ReportRow::new(row.label.clone(), cells);
            out.continuation = row.continuation;
            report.push(out);
        }
        Ok(report)
    }

    fn ratio(&self) -> Option<RatioSpec> {
        match self.layout {
            LocLayout::Proof => None,
            LocLayout::CodeProof => Some(RatioSpec {
                label: RATIO.to_string(),
                numerator: PROOF.to_string(),
                denominator: CODE.to_string(),
                grouped: true,
            }),
        }
    }

    pub fn markup_options(&self, renames: &HashMap<String, String>) -> MarkupOptions {
        let mut options = MarkupOptions {
            ratio: self.ratio(),
            renames: renames.clone(),
            ..Default::default()
        };
        match self.layout {
            LocLayout::Proof => {
                options.wrap.insert(COQ.to_string(), "loc".to_string());
            }
            LocLayout::CodeProof => {
                options.merge = Some(RATIO.to_string());
                options.small_caps = true;
            }
        }
        options
    }

    pub fn plain_options(&self, renames: &HashMap<String, String>) -> PlainOptions {
        PlainOptions {
            ratio: self.ratio(),
            renames: renames.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_markup, render_plain};
    use anyhow::Result;
    use tempfile::tempdir;

    fn write_lines(dir: &Path, rel: &str, n: usize) -> Result<()> {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "x\n".repeat(n))?;
        Ok(())
    }

    fn source(root: &str, include: &[&str], exclude: &[&str]) -> Source {
        Source {
            root: root.into(),
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn row(label: &str, code: Vec<Source>, proof: Vec<Source>) -> LocRow {
        LocRow {
            label: label.into(),
            code,
            proof,
            continuation: false,
            total: false,
            proof_note: None,
        }
    }

    #[test]
    fn counts_partial_last_line() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("a.go");
        fs::write(&path, "one\ntwo")?;
        assert_eq!(count_lines(&path)?, 2);
        fs::write(&path, "")?;
        assert_eq!(count_lines(&path)?, 0);
        Ok(())
    }

    #[test]
    fn excludes_are_removed_from_includes() -> Result<()> {
        let dir = tempdir()?;
        write_lines(dir.path(), "wal/0circular.go", 10)?;
        write_lines(dir.path(), "wal/wal.go", 20)?;
        write_lines(dir.path(), "wal/wal_test.go", 40)?;
        let roots = Roots::from([("journal".to_string(), dir.path().to_path_buf())]);
        let lines = count_sources(
            &[source("journal", &["wal/*.go"], &["wal/0circular.go", "wal/*_test.go"])],
            &roots,
        )?;
        assert_eq!(lines, Some(20));
        assert_eq!(count_sources(&[], &roots)?, None);
        Ok(())
    }

    #[test]
    fn unknown_root_is_an_error() {
        let err = count_sources(&[source("perennial", &["*.v"], &[])], &Roots::new()).unwrap_err();
        assert!(matches!(err, EvalError::UnknownRoot { name } if name == "perennial"));
    }

    #[test]
    fn code_proof_table() -> Result<()> {
        let dir = tempdir()?;
        let p = dir.path();
        write_lines(p, "go/wal.go", 100)?;
        write_lines(p, "v/wal.v", 400)?;
        write_lines(p, "v/heapspec.v", 200)?;
        write_lines(p, "go/obj.go", 50)?;
        write_lines(p, "v/obj.v", 125)?;
        write_lines(p, "go/nfs.go", 900)?;
        let roots = Roots::from([("src".to_string(), p.to_path_buf())]);

        let mut wal = row(
            "wal",
            vec![],
            vec![source("src", &["v/heapspec.v"], &[])],
        );
        wal.continuation = true;
        let mut total = row("GoJournal total", vec![], vec![]);
        total.total = true;
        let mut nfs = row("GoNFS", vec![source("src", &["go/nfs.go"], &[])], vec![]);
        nfs.proof_note = Some("Not verified".into());

        let table = LocTable {
            name: "impl".into(),
            file: "impl-loc.tex".into(),
            index: "layer".into(),
            layout: LocLayout::CodeProof,
            rows: vec![
                row(
                    "wal-sts",
                    vec![source("src", &["go/wal.go"], &[])],
                    vec![source("src", &["v/*.v"], &["v/heapspec.v", "v/obj.v"])],
                ),
                wal,
                row(
                    "obj",
                    vec![source("src", &["go/obj.go"], &[])],
                    vec![source("src", &["v/obj.v"], &[])],
                ),
                total,
                nfs,
            ],
        };

        let report = table.report(&roots)?;
        let renames = HashMap::new();
        let text = render_markup(&report, &table.markup_options(&renames))?;
        let expected = concat!(
            "\\textsc{wal-sts} & 100 & 400 & \\multirow{2}{*}{6} \\\\ \n",
            "\\textsc{wal} & --- & 200 &  \\\\ \n",
            "\\textsc{obj} & 50 & 125 & 2 \\\\ \n",
            "GoJournal total & 150 & 725 & 5 \\\\ \n",
            "GoNFS & 900 & Not verified & ---\n",
        );
        assert_eq!(text, expected);

        let plain = render_plain(&report, &table.plain_options(&renames))?;
        assert!(plain.lines().next().unwrap().trim_start().starts_with("layer"));
        Ok(())
    }

    #[test]
    fn proof_table_wraps_counts() -> Result<()> {
        let dir = tempdir()?;
        write_lines(dir.path(), "src/algebra/ghost.v", 30)?;
        write_lines(dir.path(), "src/algebra/liftable.v", 5)?;
        write_lines(dir.path(), "src/program_logic/crash.v", 12)?;
        let roots = Roots::from([("perennial".to_string(), dir.path().to_path_buf())]);
        let mut total = row("Total", vec![], vec![]);
        total.total = true;
        let table = LocTable {
            name: "perennial".into(),
            file: "perennial-loc.tex".into(),
            index: "Component".into(),
            layout: LocLayout::Proof,
            rows: vec![
                row(
                    "Ghost state and resources",
                    vec![],
                    vec![source("perennial", &["src/algebra/*.v"], &["src/algebra/liftable.v"])],
                ),
                row(
                    "Program logic for crashes",
                    vec![],
                    vec![source("perennial", &["src/program_logic/*.v"], &[])],
                ),
                total,
            ],
        };
        let report = table.report(&roots)?;
        let text = render_markup(&report, &table.markup_options(&HashMap::new()))?;
        assert_eq!(
            text,
            concat!(
                "Ghost state and resources & \\loc{30} \\\\ \n",
                "Program logic for crashes & \\loc{12} \\\\ \n",
                "Total & \\loc{42}\n",
            )
        );
        Ok(())
    }
}
