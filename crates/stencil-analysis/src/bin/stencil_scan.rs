//! Thin driver: template list in, JSON report out, CI-gating exit code.
//!
//! `stencil-scan --list <file> [--base-path <dir>] [--out <report.json>]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stencil_analysis::pipeline::{read_template_list, CorpusAnalyzer};
use stencil_core::config::AnalysisConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    list: PathBuf,
    base: PathBuf,
    out: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut list = None;
    let mut base = PathBuf::from(".");
    let mut out = None;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        let mut value = |name: &str| {
            argv.next()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        match arg.as_str() {
            "--list" => list = Some(PathBuf::from(value("--list")?)),
            "--base-path" => base = PathBuf::from(value("--base-path")?),
            "--out" => out = Some(PathBuf::from(value("--out")?)),
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    let list = list.ok_or("--list is required")?;
    Ok(Args { list, base, out })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            error!("{message}");
            eprintln!("usage: stencil-scan --list <file> [--base-path <dir>] [--out <report.json>]");
            return ExitCode::from(2);
        }
    };

    let paths = match read_template_list(&args.list) {
        Ok(paths) => paths,
        Err(err) => {
            // fatal: no partial report
            error!("{err}");
            return ExitCode::from(2);
        }
    };

    info!(templates = paths.len(), base = %args.base.display(), "analyzing corpus");
    let analyzer = CorpusAnalyzer::new(&args.base, AnalysisConfig::default());
    let report = analyzer.analyze(&paths);

    let json = match serde_json::to_string_pretty(&report) {
        Ok(json) => json,
        Err(err) => {
            error!("cannot serialize report: {err}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = write_report(args.out.as_deref(), &json) {
        error!("cannot write report: {err}");
        return ExitCode::from(2);
    }

    if report.gate_failed() {
        info!(
            issues = report.summary.total_issues,
            invalid = report.summary.invalid_templates,
            "quality gate failed"
        );
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn write_report(out: Option<&Path>, json: &str) -> std::io::Result<()> {
    match out {
        Some(path) => std::fs::write(path, json),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
