// src/classify/rules.rs

use once_cell::sync::Lazy;
use regex::Captures;
use std::str::FromStr;

use super::{Classifier, FieldError, Rule};
use crate::record::{BenchKind, Measurement};

/// Built-in rule sets, one per kind of raw log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// Output of the client scalability runs.
    Scale,
    /// Output of the filesystem comparison runs.
    Bench,
    /// `procedure<TAB>seconds` rows dumped from a packet capture.
    Rpc,
}

static SCALE: Lazy<Classifier> = Lazy::new(|| {
    Classifier::new(vec![
        Rule::comment("comment", r"^#").expect("comment rule should compile"),
        Rule::marker("series", r"^fs=(?P<label>.*)").expect("series rule should compile"),
        Rule::data(
            "smallfile",
            r"^fs-smallfile: (?P<clients>\S+) (?P<val>\S+) file/sec",
            scale_smallfile,
        )
        .expect("smallfile rule should compile"),
    ])
});

static BENCH: Lazy<Classifier> = Lazy::new(|| {
    Classifier::new(vec![
        Rule::comment("comment", r"^#").expect("comment rule should compile"),
        Rule::marker("series", r"^fs=(?P<label>.*)").expect("series rule should compile"),
        Rule::data(
            "smallfile",
            r"^fs-(?P<bench>smallfile): \S+ (?P<val>\S+) file/sec",
            bench_value,
        )
        .expect("smallfile rule should compile"),
        Rule::data(
            "largefile",
            r"^fs-(?P<bench>largefile):.* throughput (?P<val>\S+) MB/s",
            bench_value,
        )
        .expect("largefile rule should compile"),
        Rule::data("app", r"^(?P<bench>app)-bench (?P<val>\S+) app/s", bench_value)
            .expect("app rule should compile"),
    ])
});

// tshark occasionally joins two timings on one line ("1,3\t0.1,0.2");
// commas are excluded and the line must end after the time so those fall through.
static RPC: Lazy<Classifier> = Lazy::new(|| {
    Classifier::new(vec![Rule::data(
        "timing",
        r"^(?P<proc>[^\t,]+)\t(?P<time>[^\t,\s]+)\s*$",
        rpc_timing,
    )
    .expect("timing rule should compile")])
});

impl Preset {
    pub fn classifier(&self) -> &'static Classifier {
        match self {
            Preset::Scale => &*SCALE,
            Preset::Bench => &*BENCH,
            Preset::Rpc => &*RPC,
        }
    }
}

/// Parse the text of capture group `group`, reporting failures under `field`.
pub fn parse_field<T: FromStr>(
    caps: &Captures<'_>,
    group: &str,
    field: &'static str,
) -> Result<T, FieldError> {
    let text = caps.name(group).map_or("", |m| m.as_str());
    text.parse().map_err(|_| FieldError {
        field,
        text: text.to_string(),
    })
}

/// Like [`parse_field`], but `nan` and the infinities are rejected too.
pub fn parse_finite(
    caps: &Captures<'_>,
    group: &str,
    field: &'static str,
) -> Result<f64, FieldError> {
    let value: f64 = parse_field(caps, group, field)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError {
            field,
            text: caps.name(group).map_or("", |m| m.as_str()).to_string(),
        })
    }
}

fn scale_smallfile(caps: &Captures<'_>) -> Result<Measurement, FieldError> {
    Ok(Measurement::Scale {
        clients: parse_field(caps, "clients", "clients")?,
        throughput: parse_finite(caps, "val", "throughput")?,
    })
}

fn bench_value(caps: &Captures<'_>) -> Result<Measurement, FieldError> {
    let name = caps.name("bench").map_or("", |m| m.as_str());
    let bench = BenchKind::from_name(name).ok_or_else(|| FieldError {
        field: "bench",
        text: name.to_string(),
    })?;
    Ok(Measurement::Bench {
        bench,
        value: parse_finite(caps, "val", "value")?,
    })
}

fn rpc_timing(caps: &Captures<'_>) -> Result<Measurement, FieldError> {
    Ok(Measurement::RpcTiming {
        proc: parse_field(caps, "proc", "proc")?,
        seconds: parse_finite(caps, "time", "seconds")?,
    })
}
