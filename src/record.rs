// src/record.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Benchmarks reported by the filesystem comparison runs.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BenchKind {
    Smallfile,
    Largefile,
    App,
}

impl BenchKind {
    pub const ALL: [BenchKind; 3] = [BenchKind::Smallfile, BenchKind::Largefile, BenchKind::App];

    pub fn as_str(&self) -> &'static str {
        match self {
            BenchKind::Smallfile => "smallfile",
            BenchKind::Largefile => "largefile",
            BenchKind::App => "app",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == name)
    }
}

impl fmt::Display for BenchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement shape per recognized data line.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Measurement {
    /// `fs-smallfile: <clients> <rate> file/sec` from the scalability runs.
    Scale { clients: u32, throughput: f64 },
    /// A single benchmark result from the comparison runs.
    Bench { bench: BenchKind, value: f64 },
    /// One `procedure\tseconds` pair from a packet-capture field dump.
    RpcTiming { proc: u32, seconds: f64 },
}

/// A measurement tagged with the series active when its line was read.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Record {
    pub series: Option<String>,
    /// 1-based position in the input.
    pub line: usize,
    #[serde(flatten)]
    pub measurement: Measurement,
}

impl Record {
    pub fn series(&self) -> Option<&str> {
        self.series.as_deref()
    }

    pub fn clients(&self) -> Option<u32> {
        match self.measurement {
            Measurement::Scale { clients, .. } => Some(clients),
            _ => None,
        }
    }

    pub fn bench(&self) -> Option<BenchKind> {
        match self.measurement {
            Measurement::Bench { bench, .. } => Some(bench),
            _ => None,
        }
    }

    /// The primary numeric value of the record, whatever its shape.
    pub fn value(&self) -> f64 {
        match self.measurement {
            Measurement::Scale { throughput, .. } => throughput,
            Measurement::Bench { value, .. } => value,
            Measurement::RpcTiming { seconds, .. } => seconds,
        }
    }
}
