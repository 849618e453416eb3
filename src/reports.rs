// src/reports.rs

//! End-to-end pipelines: log lines in, rendered outputs out. Nothing here
//! touches the filesystem except line counting; callers write the returned
//! outputs once every one of them rendered.

use std::path::Path;
use tracing::{info, instrument, warn};

use crate::classify::Preset;
use crate::config::EvalConfig;
use crate::error::Result;
use crate::latency::{group_by_proc, render_summary};
use crate::output::Output;
use crate::parse::{parse, ParseOptions};
use crate::record::{BenchKind, Record};
use crate::render::{render_delimited, render_markup, render_plain, DelimitedOptions};
use crate::table::{pivot, AxisOrder, FillPolicy, PivotOptions};

const LARGEFILE: &str = "largefile";

/// Parse with `preset`, logging every unrecognized line.
pub fn parse_logged<S: AsRef<str>>(
    preset: Preset,
    lines: &[S],
    cfg: &EvalConfig,
) -> Result<Vec<Record>> {
    let out = parse(
        preset.classifier(),
        lines,
        ParseOptions {
            on_malformed: cfg.on_malformed,
        },
    )?;
    for line in &out.diagnostics {
        warn!("ignored line: {}", line);
    }
    Ok(out.records)
}

/// Smallfile throughput by client count, one headerless file per series.
#[instrument(level = "info", skip_all, fields(lines = lines.len()))]
pub fn scale_outputs<S: AsRef<str>>(
    lines: &[S],
    cfg: &EvalConfig,
    out_dir: &Path,
) -> Result<Vec<Output>> {
    let records = parse_logged(Preset::Scale, lines, cfg)?;
    let table = pivot(
        &records,
        |r: &Record| r.clients(),
        |r: &Record| r.series().map(str::to_string),
        |r: &Record| Some(r.value()),
        &PivotOptions {
            rows: AxisOrder::Sorted,
            columns: AxisOrder::Natural,
            fill: FillPolicy::ForwardFill,
            duplicates: cfg.duplicates,
        },
    )?;
    info!(clients = table.rows().len(), series = table.columns().len(), "scale table");

    cfg.scale
        .series
        .iter()
        .map(|s| {
            let text = render_delimited(
                &table,
                &DelimitedOptions {
                    columns: Some(vec![s.column.clone()]),
                    header: None,
                    float: cfg.float_format,
                },
            )?;
            Ok(Output::new(out_dir.join(&s.file), text))
        })
        .collect()
}

/// The benchmark comparison table and the per-filesystem largefile table.
#[instrument(level = "info", skip_all, fields(lines = lines.len()))]
pub fn bench_outputs<S: AsRef<str>>(
    lines: &[S],
    cfg: &EvalConfig,
    out_dir: &Path,
) -> Result<Vec<Output>> {
    let records = parse_logged(Preset::Bench, lines, cfg)?;

    let table = pivot(
        &records,
        |r: &Record| r.bench(),
        |r: &Record| r.series().map(str::to_string),
        |r: &Record| Some(r.value()),
        &PivotOptions {
            rows: AxisOrder::Canonical(cfg.bench.rows.clone()),
            columns: AxisOrder::Natural,
            duplicates: cfg.duplicates,
            ..Default::default()
        },
    )?;
    let mut columns = cfg.bench.columns.clone();
    for extra in &cfg.bench.extra_columns {
        if table.columns().contains(&extra.when) {
            columns.extend(extra.columns.iter().cloned());
        }
    }
    let bench = render_delimited(
        &table,
        &DelimitedOptions {
            columns: Some(columns),
            header: Some("bench".to_string()),
            float: cfg.float_format,
        },
    )?;

    let largefile = pivot(
        records
            .iter()
            .filter(|r| r.bench() == Some(BenchKind::Largefile)),
        |r: &Record| r.series().map(str::to_string),
        |_: &Record| Some(LARGEFILE.to_string()),
        |r: &Record| Some(r.value()),
        &PivotOptions {
            rows: AxisOrder::Sorted,
            columns: AxisOrder::Canonical(vec![LARGEFILE.to_string()]),
            duplicates: cfg.duplicates,
            ..Default::default()
        },
    )?;
    let largefile = render_delimited(
        &largefile,
        &DelimitedOptions {
            columns: None,
            header: Some("fs".to_string()),
            float: cfg.float_format,
        },
    )?;

    Ok(vec![
        Output::new(out_dir.join(&cfg.bench.file), bench),
        Output::new(out_dir.join(&cfg.bench.largefile_file), largefile),
    ])
}

/// Per-procedure latency lines for a packet-capture field dump.
pub fn times_summary<S: AsRef<str>>(lines: &[S], cfg: &EvalConfig, stats: bool) -> Result<String> {
    let records = parse_logged(Preset::Rpc, lines, cfg)?;
    Ok(render_summary(&group_by_proc(&records), stats))
}

/// Parsed records as JSON lines.
pub fn records_json<S: AsRef<str>>(preset: Preset, lines: &[S], cfg: &EvalConfig) -> Result<String> {
    let mut text = String::new();
    for record in parse_logged(preset, lines, cfg)? {
        text.push_str(&serde_json::to_string(&record)?);
        text.push('\n');
    }
    Ok(text)
}

/// One markup fragment per configured line-count table.
pub fn loc_markup(cfg: &EvalConfig, dir: &Path) -> Result<Vec<Output>> {
    cfg.loc
        .tables
        .iter()
        .map(|table| {
            let report = table.report(&cfg.roots)?;
            let text = render_markup(&report, &table.markup_options(&cfg.renames))?;
            Ok(Output::new(dir.join(&table.file), text))
        })
        .collect()
}

/// Every line-count table as console text, separated by blank lines.
pub fn loc_plain(cfg: &EvalConfig) -> Result<String> {
    let rendered = cfg
        .loc
        .tables
        .iter()
        .map(|table| render_plain(&table.report(&cfg.roots)?, &table.plain_options(&cfg.renames)))
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::loc::{LocLayout, LocRow, LocTable, Source};
    use std::{fs, path::PathBuf};
    use tempfile::tempdir;

    fn cfg() -> EvalConfig {
        EvalConfig::load(None).unwrap()
    }

    fn contents(outputs: &[Output]) -> Vec<(String, &str)> {
        outputs
            .iter()
            .map(|o| {
                let name = o.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, o.contents.as_str())
            })
            .collect()
    }

    const SCALE_LOG: &[&str] = &[
        "# scalability run",
        "fs=gonfs",
        "fs-smallfile: 1 100.0 file/sec",
        "fs-smallfile: 2 180.0 file/sec",
        "fs=linux",
        "fs-smallfile: 1 90.0 file/sec",
        "warning: clock skew detected",
        "fs=serial-gonfs",
        "fs-smallfile: 1 50.0 file/sec",
        "fs-smallfile: 2 60.5 file/sec",
    ];

    #[test]
    fn scale_writes_one_file_per_series() {
        let outputs = scale_outputs(SCALE_LOG, &cfg(), Path::new("out")).unwrap();
        assert_eq!(outputs[0].path, PathBuf::from("out/gnfs.data"));
        assert_eq!(
            contents(&outputs),
            vec![
                ("gnfs.data".to_string(), "1\t100\n2\t180\n"),
                // linux has no 2-client point; the last one carries down
                ("linux-nfs.data".to_string(), "1\t90\n2\t90\n"),
                ("serial.data".to_string(), "1\t50\n2\t60.5\n"),
            ]
        );
    }

    #[test]
    fn scale_uses_fixed_precision_from_config() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("eval.yaml");
        fs::write(&path, "float_format: {fixed: 1}\n")?;
        let cfg = EvalConfig::load(Some(&path))?;

        let outputs = scale_outputs(SCALE_LOG, &cfg, Path::new("out"))?;
        assert_eq!(outputs[0].contents, "1\t100.0\n2\t180.0\n");
        assert_eq!(outputs[2].contents, "1\t50.0\n2\t60.5\n");
        Ok(())
    }

    #[test]
    fn scale_requires_every_configured_series() {
        let err = scale_outputs(&SCALE_LOG[..7], &cfg(), Path::new("out")).unwrap_err();
        assert!(matches!(err, EvalError::Column { column } if column == "serial-gonfs"));
    }

    #[test]
    fn scale_aborts_on_malformed_throughput() {
        let lines = ["fs=gonfs", "fs-smallfile: 1 N/A file/sec"];
        let err = scale_outputs(&lines, &cfg(), Path::new("out")).unwrap_err();
        assert!(matches!(err, EvalError::MalformedRecord { line: 2, .. }));
    }

    const BENCH_LOG: &[&str] = &[
        "fs=linux",
        "fs-smallfile: 100 500.0 file/sec",
        "fs-largefile: 100 MB throughput 120.0 MB/s",
        "app-bench 2.0 app/s",
        "fs=gonfs",
        "fs-smallfile: 100 800.0 file/sec",
        "fs-largefile: 100 MB throughput 98.5 MB/s",
        "app-bench 1.5 app/s",
    ];

    #[test]
    fn bench_tables() {
        let outputs = bench_outputs(BENCH_LOG, &cfg(), Path::new("data")).unwrap();
        assert_eq!(
            contents(&outputs),
            vec![
                (
                    "bench.data".to_string(),
                    "bench\tlinux\tgonfs\nsmallfile\t500\t800\nlargefile\t120\t98.5\napp\t2\t1.5\n"
                ),
                ("largefile.data".to_string(), "fs\tlargefile\ngonfs\t98.5\nlinux\t120\n"),
            ]
        );
    }

    #[test]
    fn bench_adds_ssd_columns_when_observed() {
        let mut lines = BENCH_LOG.to_vec();
        lines.extend([
            "fs=linux-ssd",
            "fs-smallfile: 100 900.0 file/sec",
            "fs=gonfs-ssd",
            "fs-smallfile: 100 1000.0 file/sec",
        ]);
        let outputs = bench_outputs(&lines[..], &cfg(), Path::new("data")).unwrap();
        assert_eq!(
            outputs[0].contents,
            concat!(
                "bench\tlinux\tgonfs\tlinux-ssd\tgonfs-ssd\n",
                "smallfile\t500\t800\t900\t1000\n",
                "largefile\t120\t98.5\t\t\n",
                "app\t2\t1.5\t\t\n",
            )
        );
        assert!(!outputs[1].contents.contains("linux-ssd"));
    }

    #[test]
    fn bench_rejects_conflicting_repeats() {
        let mut lines = BENCH_LOG.to_vec();
        lines.push("app-bench 1.7 app/s");
        let err = bench_outputs(&lines[..], &cfg(), Path::new("data")).unwrap_err();
        assert!(matches!(err, EvalError::DuplicateKey { ref row, .. } if row == "app"));
    }

    #[test]
    fn times_lines() {
        let lines = ["3\t0.000010", "3\t0.000030", "1,3\t0.1,0.2"];
        let text = times_summary(&lines, &cfg(), false).unwrap();
        assert_eq!(text, "    LOOKUP\t       2\t20.0 us/op\t\n");
    }

    #[test]
    fn records_as_json_lines() {
        let text = records_json(Preset::Scale, &SCALE_LOG[..4], &cfg()).unwrap();
        let values: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["series"], "gonfs");
        assert_eq!(values[0]["shape"], "scale");
        assert_eq!(values[1]["clients"], 2);
        assert_eq!(values[1]["line"], 4);
    }

    #[test]
    fn loc_tables_render_both_ways() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.v"), "1\n2\n3\n")?;
        fs::write(dir.path().join("b.v"), "1\n")?;

        let mut cfg = cfg().with_roots([("p".to_string(), dir.path().to_path_buf())]);
        cfg.loc.tables = vec![LocTable {
            name: "tiny".into(),
            file: "tiny.tex".into(),
            index: "Component".into(),
            layout: LocLayout::Proof,
            rows: vec![
                LocRow {
                    label: "All".into(),
                    code: vec![],
                    proof: vec![Source {
                        root: "p".into(),
                        include: vec!["*.v".into()],
                        exclude: vec![],
                    }],
                    continuation: false,
                    total: false,
                    proof_note: None,
                },
            ],
        }];

        let outputs = loc_markup(&cfg, Path::new("tex"))?;
        assert_eq!(outputs, vec![Output::new("tex/tiny.tex", "All & \\loc{4}\n")]);
        assert_eq!(
            loc_plain(&cfg)?,
            "Component  Lines of Coq\n      All             4\n"
        );
        Ok(())
    }
}
