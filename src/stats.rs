//! # Analytics Module
//!
//! Funnel-event accounting. The live bot tags notable moments with a
//! structured `STAT|...` marker inside ordinary log lines; the offline
//! reconstructor scans historical log files and rebuilds event counts
//! from three sources per line: the structured marker, legacy free-text
//! phrases, and Telegram update payloads dumped as JSON.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::debug;

use crate::lexicon;

/// Marker prefix recognised inside log lines
pub const STAT_PREFIX: &str = "STAT|";

/// Funnel events tracked across the product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    PhotoUpload,
    PaywallView,
    PaymentSuccess,
    DiagnosisResult,
}

impl EventKind {
    /// Canonical marker name, as written into log lines
    pub fn marker_name(&self) -> &'static str {
        match self {
            EventKind::Start => "Start_bot",
            EventKind::PhotoUpload => "Photo_upload",
            EventKind::PaywallView => "Paywall_view",
            EventKind::PaymentSuccess => "Payment_success",
            EventKind::DiagnosisResult => "Diagnosis_result",
        }
    }

    fn from_marker_name(name: &str) -> Option<Self> {
        match name {
            "Start_bot" => Some(EventKind::Start),
            "Photo_upload" => Some(EventKind::PhotoUpload),
            "Paywall_view" => Some(EventKind::PaywallView),
            "Payment_success" => Some(EventKind::PaymentSuccess),
            "Diagnosis_result" => Some(EventKind::DiagnosisResult),
            _ => None,
        }
    }
}

/// Reconstructed event counts over a time window
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub starts: u64,
    pub photo_uploads: u64,
    pub paywall_views: u64,
    pub payment_successes: u64,
    pub diagnosis_results: u64,
}

impl StatsSnapshot {
    fn bump(&mut self, kind: EventKind) {
        match kind {
            EventKind::Start => self.starts += 1,
            EventKind::PhotoUpload => self.photo_uploads += 1,
            EventKind::PaywallView => self.paywall_views += 1,
            EventKind::PaymentSuccess => self.payment_successes += 1,
            EventKind::DiagnosisResult => self.diagnosis_results += 1,
        }
    }

    pub fn get(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::Start => self.starts,
            EventKind::PhotoUpload => self.photo_uploads,
            EventKind::PaywallView => self.paywall_views,
            EventKind::PaymentSuccess => self.payment_successes,
            EventKind::DiagnosisResult => self.diagnosis_results,
        }
    }
}

/// Build the structured marker for one event, ready to log
pub fn build_stat_message(kind: EventKind, user_id: i64, extra: &[(&str, &str)]) -> String {
    let mut line = format!("{}event={}|user={}", STAT_PREFIX, kind.marker_name(), user_id);
    for (key, value) in extra {
        line.push('|');
        line.push_str(key);
        line.push('=');
        line.push_str(value);
    }
    line
}

/// Collect log files in `dir` whose names start with `prefix`, sorted by name
pub fn list_stat_log_paths(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read log directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.context("Failed to read log directory entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(prefix))
            .unwrap_or(false);
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Timestamps come in two flavours depending on the logger generation
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%d.%m.%Y %H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_str(raw, "%d.%m.%Y %H:%M:%S%.f%z"))
        .ok()
}

fn structured_event(message: &str) -> Option<EventKind> {
    let start = message.find(STAT_PREFIX)?;
    let payload = &message[start + STAT_PREFIX.len()..];
    let mut fields = HashMap::new();
    for part in payload.split('|') {
        if let Some((key, value)) = part.split_once('=') {
            fields.insert(key.trim(), value.trim());
        }
    }
    fields
        .get("event")
        .and_then(|name| EventKind::from_marker_name(name))
}

fn legacy_events(message: &str) -> Vec<EventKind> {
    let mut events = Vec::new();
    if message.contains(lexicon::LOG_ACTION_LIMIT) || message.contains(lexicon::LOG_PICTURES_LIMIT)
    {
        events.push(EventKind::PaywallView);
    }
    if message.contains(lexicon::LOG_PAYMENT_SUCCESS) {
        events.push(EventKind::PaymentSuccess);
    }
    if message.contains(lexicon::LOG_DIAGNOSIS_RESULT) {
        events.push(EventKind::DiagnosisResult);
    }
    events
}

/// Inspect a JSON update dump embedded in a log line.
///
/// Photo uploads are only counted once per sender across the whole pass;
/// `seen_photo_senders` carries that memory between lines.
fn update_payload_event(message: &str, seen_photo_senders: &mut HashSet<i64>) -> Option<EventKind> {
    let json_start = message.find('{')?;
    let value: Value = serde_json::from_str(&message[json_start..]).ok()?;
    value.get("update_id")?;

    let msg = value.get("message").or_else(|| value.get("edited_message"))?;
    let from = msg.get("from")?;
    if from.get("is_bot").and_then(Value::as_bool).unwrap_or(true) {
        return None;
    }

    if let Some(text) = msg.get("text").and_then(Value::as_str) {
        if text.starts_with("/start") {
            return Some(EventKind::Start);
        }
    }

    let has_photo = msg
        .get("photo")
        .and_then(Value::as_array)
        .map(|sizes| !sizes.is_empty())
        .unwrap_or(false);
    if has_photo {
        let sender = from.get("id").and_then(Value::as_i64)?;
        if seen_photo_senders.insert(sender) {
            return Some(EventKind::PhotoUpload);
        }
    }
    None
}

fn in_window(
    ts: DateTime<FixedOffset>,
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
) -> bool {
    if let Some(start) = start {
        if ts < start {
            return false;
        }
    }
    if let Some(end) = end {
        if ts >= end {
            return false;
        }
    }
    true
}

/// Rebuild event counts from raw log lines.
///
/// Each line is expected as `<timestamp> | <message>`; lines without a
/// parseable timestamp are skipped. A line may contribute a structured
/// event, legacy-phrase events and an update-payload event all at once.
pub fn reconstruct<'a, I>(
    lines: I,
    window_start: Option<DateTime<FixedOffset>>,
    window_end: Option<DateTime<FixedOffset>>,
) -> StatsSnapshot
where
    I: IntoIterator<Item = &'a str>,
{
    let mut snapshot = StatsSnapshot::default();
    let mut seen_photo_senders = HashSet::new();

    for line in lines {
        let Some((raw_ts, message)) = line.split_once(" | ") else {
            continue;
        };
        let Some(ts) = parse_timestamp(raw_ts.trim()) else {
            debug!(line, "Skipping log line with unparseable timestamp");
            continue;
        };
        if !in_window(ts, window_start, window_end) {
            continue;
        }

        if let Some(kind) = structured_event(message) {
            snapshot.bump(kind);
        }
        for kind in legacy_events(message) {
            snapshot.bump(kind);
        }
        if let Some(kind) = update_payload_event(message, &mut seen_photo_senders) {
            snapshot.bump(kind);
        }
    }

    snapshot
}

/// Read and reconstruct across a set of log files
pub fn reconstruct_from_files(
    paths: &[PathBuf],
    window_start: Option<DateTime<FixedOffset>>,
    window_end: Option<DateTime<FixedOffset>>,
) -> Result<StatsSnapshot> {
    let mut all_lines = Vec::new();
    for path in paths {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file {}", path.display()))?;
        all_lines.push(content);
    }
    Ok(reconstruct(
        all_lines.iter().flat_map(|c| c.lines()),
        window_start,
        window_end,
    ))
}
