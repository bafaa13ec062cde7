//! Offline funnel report over rotated bot log files.
//!
//! Usage:
//!   stats-report [--dir DIR] [--prefix NAME] [--from "01.01.2024 00:00:00+0000"] [--to ...]

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};

use plantdoc::stats::{list_stat_log_paths, reconstruct_from_files, EventKind};

struct ReportArgs {
    dir: PathBuf,
    prefix: String,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
}

fn parse_bound(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%d.%m.%Y %H:%M:%S%z")
        .with_context(|| format!("bad timestamp {raw:?}, expected dd.mm.yyyy HH:MM:SS+zzzz"))
}

fn parse_args() -> Result<ReportArgs> {
    let mut args = ReportArgs {
        dir: PathBuf::from("logs"),
        prefix: "plantdoc.log".to_string(),
        from: None,
        to: None,
    };

    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .with_context(|| format!("missing value for {flag}"))
        };
        match flag.as_str() {
            "--dir" => args.dir = PathBuf::from(value()?),
            "--prefix" => args.prefix = value()?,
            "--from" => args.from = Some(parse_bound(&value()?)?),
            "--to" => args.to = Some(parse_bound(&value()?)?),
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let paths = list_stat_log_paths(&args.dir, &args.prefix)?;
    if paths.is_empty() {
        bail!(
            "no log files matching {:?} under {}",
            args.prefix,
            args.dir.display()
        );
    }

    let snapshot = reconstruct_from_files(&paths, args.from, args.to)?;

    println!("Funnel report ({} log files)", paths.len());
    for (label, kind) in [
        ("starts", EventKind::Start),
        ("photo uploads", EventKind::PhotoUpload),
        ("paywall views", EventKind::PaywallView),
        ("payments", EventKind::PaymentSuccess),
        ("diagnoses", EventKind::DiagnosisResult),
    ] {
        println!("  {label:<14} {}", snapshot.get(kind));
    }
    Ok(())
}
