use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io::{self, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use nfs_eval::{
    output::{read_lines, write_outputs},
    reports, EvalConfig, Preset,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Turn NFS benchmark logs into plot data and paper tables"
)]
struct Args {
    /// YAML file merged over the built-in settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Smallfile scalability: one .data file per filesystem series
    Scale {
        /// Log file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Benchmark comparison: bench.data and largefile.data
    Bench {
        #[arg(default_value = "-")]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Per-procedure RPC latency from a packet-capture field dump
    Times {
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
        /// Also report the 50th and 90th percentiles
        #[arg(long)]
        stats: bool,
    },
    /// Lines of code and proof for the configured source trees
    Loc {
        /// Write .tex fragments here instead of printing tables
        #[arg(long)]
        latex: Option<PathBuf>,
        /// Source root as NAME=PATH
        #[arg(long = "root", value_parser = parse_root)]
        roots: Vec<(String, PathBuf)>,
    },
    /// Dump parsed records as JSON lines
    Records {
        #[arg(long, value_enum)]
        preset: Preset,
        #[arg(default_value = "-")]
        input: PathBuf,
    },
}

fn parse_root(s: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got `{}`", s))?;
    Ok((name.to_string(), PathBuf::from(path)))
}

fn print(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes()).context("writing to stdout")?;
    stdout.flush().context("flushing stdout")
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries data.
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let cfg = EvalConfig::load(args.config.as_deref()).context("loading configuration")?;

    match args.command {
        Command::Scale { input, output } => {
            let lines = read_lines(&input)?;
            let dir = output.unwrap_or_else(|| cfg.output_dir.clone());
            let outputs = reports::scale_outputs(&lines, &cfg, &dir)
                .with_context(|| format!("building scalability data from {}", input.display()))?;
            write_outputs(&outputs)?;
        }
        Command::Bench { input, output } => {
            let lines = read_lines(&input)?;
            let dir = output.unwrap_or_else(|| cfg.output_dir.clone());
            let outputs = reports::bench_outputs(&lines, &cfg, &dir)
                .with_context(|| format!("building benchmark data from {}", input.display()))?;
            write_outputs(&outputs)?;
        }
        Command::Times { input, stats } => {
            let lines = read_lines(&input)?;
            print(&reports::times_summary(&lines, &cfg, stats)?)?;
        }
        Command::Loc { latex, roots } => {
            let cfg = cfg.with_roots(roots);
            match latex {
                Some(dir) => {
                    let outputs =
                        reports::loc_markup(&cfg, &dir).context("counting lines for tables")?;
                    write_outputs(&outputs)?;
                }
                None => print(&reports::loc_plain(&cfg).context("counting lines")?)?,
            }
        }
        Command::Records { preset, input } => {
            let lines = read_lines(&input)?;
            print(&reports::records_json(preset, &lines, &cfg)?)?;
        }
    }

    info!("done");
    Ok(())
}
