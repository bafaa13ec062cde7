//! Reconstruction of funnel counts from rotated log files on disk.

use std::fs;

use chrono::DateTime;
use plantdoc::stats::{
    build_stat_message, list_stat_log_paths, reconstruct_from_files, EventKind,
};

/// A realistic mixed log: structured markers, legacy phrases, raw update
/// dumps and noise lines
#[test]
fn test_report_over_rotated_files() {
    let dir = tempfile::tempdir().unwrap();

    let day_one = format!(
        "01.01.2024 09:00:00+0000 | {}\n\
         01.01.2024 09:00:01+0000 | incoming update {{\"update_id\": 1, \"message\": {{\"from\": {{\"id\": 5, \"is_bot\": false}}, \"text\": \"/start\"}}}}\n\
         01.01.2024 09:05:00+0000 | {}\n\
         01.01.2024 09:05:10+0000 | diagnosis delivered to user 5\n\
         malformed line without timestamp\n",
        build_stat_message(EventKind::Start, 5, &[]),
        build_stat_message(EventKind::PhotoUpload, 5, &[]),
    );
    let day_two = format!(
        "02.01.2024 10:00:00+0000 | action limit exceeded for user 5\n\
         02.01.2024 10:01:00+0000 | successful payment from user 5: {}\n",
        build_stat_message(EventKind::PaymentSuccess, 5, &[("plan", "month")]),
    );
    fs::write(dir.path().join("plantdoc.log"), day_two).unwrap();
    fs::write(dir.path().join("plantdoc.log.1"), day_one).unwrap();
    fs::write(dir.path().join("unrelated.txt"), "noise").unwrap();

    let paths = list_stat_log_paths(dir.path(), "plantdoc.log").unwrap();
    assert_eq!(paths.len(), 2);

    let snapshot = reconstruct_from_files(&paths, None, None).unwrap();
    // structured Start marker + embedded /start update
    assert_eq!(snapshot.starts, 2);
    assert_eq!(snapshot.photo_uploads, 1);
    assert_eq!(snapshot.paywall_views, 1);
    // structured marker and legacy phrase share the payment line
    assert_eq!(snapshot.payment_successes, 2);
    assert_eq!(snapshot.diagnosis_results, 1);
}

/// Window bounds cut the second day off
#[test]
fn test_window_restricts_to_first_day() {
    let dir = tempfile::tempdir().unwrap();
    let content = format!(
        "01.01.2024 09:00:00+0000 | {}\n\
         02.01.2024 09:00:00+0000 | {}\n",
        build_stat_message(EventKind::Start, 5, &[]),
        build_stat_message(EventKind::Start, 6, &[]),
    );
    fs::write(dir.path().join("plantdoc.log"), content).unwrap();

    let paths = list_stat_log_paths(dir.path(), "plantdoc.log").unwrap();
    let from = DateTime::parse_from_str("01.01.2024 00:00:00+0000", "%d.%m.%Y %H:%M:%S%z").unwrap();
    let to = DateTime::parse_from_str("02.01.2024 00:00:00+0000", "%d.%m.%Y %H:%M:%S%z").unwrap();

    let snapshot = reconstruct_from_files(&paths, Some(from), Some(to)).unwrap();
    assert_eq!(snapshot.starts, 1);
}

/// Missing directory surfaces as an error, not a panic
#[test]
fn test_missing_directory_is_an_error() {
    let result = list_stat_log_paths(std::path::Path::new("/nonexistent/dir"), "plantdoc.log");
    assert!(result.is_err());
}
