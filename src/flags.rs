//! # Response Flags Module
//!
//! The photo-analysis prompt asks the model to end its answer with strict
//! `PLANT: YES|NO` and `QUALITY: GOOD|BAD` lines, and to include a
//! `N/10` health score somewhere in the body. This module extracts those
//! signals and strips the flag lines before the text is shown to the user.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FLAG_RE: Regex =
        Regex::new(r"(?im)^[ \t]*(PLANT|QUALITY)[ \t]*:[ \t]*(YES|NO|GOOD|BAD)[ \t]*$")
            .expect("flag pattern should be valid");
    static ref SCORE_RE: Regex =
        Regex::new(r"(\d{1,2})/10").expect("score pattern should be valid");
    static ref BLANK_RUN_RE: Regex =
        Regex::new(r"\n{3,}").expect("blank-run pattern should be valid");
}

/// Structured signals extracted from a photo-analysis response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSignals {
    /// Response text with flag lines removed and blank runs collapsed
    pub cleaned_text: String,
    /// `PLANT: YES` was present; absent or `NO` both mean not detected
    pub plant_detected: bool,
    /// `QUALITY` flag if the model emitted one
    pub quality_ok: Option<bool>,
    /// Health score from an `N/10` match in the original text
    pub health_score: Option<u8>,
}

/// Extract flags and score from a raw model response.
///
/// The last occurrence of each flag key wins. The score is searched in the
/// original text so a score inside a stripped line still counts.
pub fn extract_signals(raw: &str) -> ResponseSignals {
    let mut plant: Option<&str> = None;
    let mut quality: Option<&str> = None;
    for caps in FLAG_RE.captures_iter(raw) {
        let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if key.eq_ignore_ascii_case("PLANT") {
            plant = Some(value);
        } else {
            quality = Some(value);
        }
    }

    ResponseSignals {
        cleaned_text: strip_flags(raw),
        plant_detected: plant
            .map(|v| v.eq_ignore_ascii_case("YES"))
            .unwrap_or(false),
        quality_ok: quality.map(|v| v.eq_ignore_ascii_case("GOOD")),
        health_score: extract_health_score(raw),
    }
}

/// Remove flag lines and collapse the blank runs left behind
pub fn strip_flags(raw: &str) -> String {
    let without_flags = FLAG_RE.replace_all(raw, "");
    let collapsed = BLANK_RUN_RE.replace_all(&without_flags, "\n\n");
    collapsed.trim().to_string()
}

/// Find the first `N/10` score (one or two digits) anywhere in the text
pub fn extract_health_score(text: &str) -> Option<u8> {
    SCORE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_extracted_and_stripped() {
        let raw = "Analysis complete.\nPLANT: YES\nQUALITY: GOOD\n";
        let signals = extract_signals(raw);
        assert!(signals.plant_detected);
        assert_eq!(signals.quality_ok, Some(true));
        assert_eq!(signals.cleaned_text, "Analysis complete.");
        assert!(!signals.cleaned_text.contains("PLANT"));
    }

    #[test]
    fn test_flags_absent() {
        let signals = extract_signals("just words");
        assert!(!signals.plant_detected);
        assert_eq!(signals.quality_ok, None);
        assert_eq!(signals.health_score, None);
        assert_eq!(signals.cleaned_text, "just words");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let raw = "PLANT: NO\nsome text\nPLANT: YES\n";
        let signals = extract_signals(raw);
        assert!(signals.plant_detected);
    }

    #[test]
    fn test_case_insensitive_flags() {
        let raw = "plant: yes\nQuality: bad\n";
        let signals = extract_signals(raw);
        assert!(signals.plant_detected);
        assert_eq!(signals.quality_ok, Some(false));
    }

    #[test]
    fn test_flag_needs_full_line() {
        // a flag-like fragment mid-line is not a flag
        let signals = extract_signals("the model said PLANT: YES somewhere");
        assert!(!signals.plant_detected);
        assert_eq!(
            signals.cleaned_text,
            "the model said PLANT: YES somewhere"
        );
    }

    #[test]
    fn test_score_extraction() {
        assert_eq!(extract_health_score("score is 7/10"), Some(7));
        assert_eq!(extract_health_score("📊 Health Score: 🟢 10/10!"), Some(10));
        assert_eq!(extract_health_score("no score here"), None);
    }

    #[test]
    fn test_blank_runs_collapsed() {
        let raw = "top\nPLANT: YES\n\n\n\nbottom";
        let signals = extract_signals(raw);
        assert_eq!(signals.cleaned_text, "top\n\nbottom");
    }

    #[test]
    fn test_score_survives_stripping() {
        let raw = "Health Score: 3/10\nPLANT: YES";
        let signals = extract_signals(raw);
        assert_eq!(signals.health_score, Some(3));
        assert!(signals.plant_detected);
    }
}
