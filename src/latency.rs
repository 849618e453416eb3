//! Per-procedure latency summaries from NFSv3 RPC timings.

use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::debug;

use crate::record::{Measurement, Record};

/// NFSv3 procedure numbers (RFC 1813).
static PROC_NAMES: &[(u32, &str)] = &[
    (0, "NULL"),
    (1, "GETATTR"),
    (2, "SETATTR"),
    (3, "LOOKUP"),
    (4, "ACCESS"),
    (6, "READ"),
    (7, "WRITE"),
    (8, "CREATE"),
    (9, "MKDIR"),
    (10, "SYMLINK"),
    (12, "REMOVE"),
    (13, "RMDIR"),
    (14, "RENAME"),
    (15, "LINK"),
    (16, "READDIR"),
    (17, "READDIRPLUS"),
    (18, "FSSTAT"),
    (19, "FSINFO"),
    (20, "PATHCONF"),
    (21, "COMMIT"),
];

/// Display name for a procedure number; unknown procedures keep their number.
pub fn proc_name(proc: u32) -> String {
    PROC_NAMES
        .iter()
        .find(|(n, _)| *n == proc)
        .map_or_else(|| proc.to_string(), |(_, name)| name.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcLatency {
    pub proc: u32,
    pub name: String,
    /// Microseconds, in input order.
    pub micros: Vec<f64>,
}

impl ProcLatency {
    pub fn count(&self) -> usize {
        self.micros.len()
    }

    /// `None` without samples.
    pub fn mean(&self) -> Option<f64> {
        if self.micros.is_empty() {
            return None;
        }
        Some(self.micros.iter().sum::<f64>() / self.micros.len() as f64)
    }

    /// Quantile `q` in `[0, 1]`, interpolating linearly between closest ranks.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let last = self.micros.len().checked_sub(1)?;
        let mut sorted = self.micros.clone();
        sorted.sort_by(f64::total_cmp);
        let pos = q.clamp(0.0, 1.0) * last as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
    }
}

/// Group RPC timings by procedure, in order of first appearance.
/// Records of other shapes are ignored.
pub fn group_by_proc(records: &[Record]) -> Vec<ProcLatency> {
    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut out: Vec<ProcLatency> = Vec::new();
    for record in records {
        let Measurement::RpcTiming { proc, seconds } = record.measurement else {
            continue;
        };
        let slot = *index.entry(proc).or_insert_with(|| {
            out.push(ProcLatency {
                proc,
                name: proc_name(proc),
                micros: Vec::new(),
            });
            out.len() - 1
        });
        out[slot].micros.push(seconds * 1e6);
    }
    debug!(procedures = out.len(), "grouped rpc timings");
    out
}

/// One line per procedure: name, call count, mean and optionally median and
/// 90th percentile, all in microseconds. Procedures without samples are left out.
pub fn render_summary(procs: &[ProcLatency], stats: bool) -> String {
    let mut text = String::new();
    for p in procs {
        let (Some(mean), Some(p50), Some(p90)) = (p.mean(), p.quantile(0.5), p.quantile(0.9))
        else {
            continue;
        };
        let _ = write!(text, "{:>10}\t{:8}\t{:.1} us/op\t", p.name, p.count(), mean);
        if stats {
            let _ = write!(text, "(50th: {:.1} us)\t(90th: {:.1} us)", p50, p90);
        }
        text.push('\n');
    }
    text
}
