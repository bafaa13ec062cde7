//! # Plan Rendering
//!
//! Turns a stored diagnosis into a care-plan document for the one-time
//! paid option. The rendering backend is pluggable; the default writes a
//! plain-text document.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::db::Diagnosis;

/// Document rendering backend
pub trait PlanRenderer {
    /// Write `text` as a plan document titled `title` to `output_path`
    fn render_plan(&self, text: &str, output_path: &Path, title: &str) -> Result<()>;
}

/// Plain-text renderer used until a richer backend lands
pub struct TextPlanRenderer;

impl PlanRenderer for TextPlanRenderer {
    fn render_plan(&self, text: &str, output_path: &Path, title: &str) -> Result<()> {
        let underline = "=".repeat(title.chars().count());
        let document = format!("{}\n{}\n\n{}\n", title, underline, text);
        fs::write(output_path, document)
            .with_context(|| format!("Failed to write plan to {}", output_path.display()))?;
        Ok(())
    }
}

/// Compose the plan body from a diagnosis record
pub fn plan_text(diagnosis: &Diagnosis) -> String {
    format!(
        "Health score: {}/10\n\n{}",
        diagnosis.health_score, diagnosis.response_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_diagnosis() -> Diagnosis {
        Diagnosis {
            id: 1,
            tg_id: 5,
            thread_id: "t1".to_string(),
            file_id: "f1".to_string(),
            response_text: "Needs more light.".to_string(),
            health_score: 4,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_text_includes_score_and_body() {
        let text = plan_text(&sample_diagnosis());
        assert!(text.starts_with("Health score: 4/10"));
        assert!(text.contains("Needs more light."));
    }

    #[test]
    fn test_text_renderer_writes_titled_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.txt");

        TextPlanRenderer
            .render_plan("Water twice a week.", &path, "Rescue Plan")
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Rescue Plan\n===========\n"));
        assert!(written.contains("Water twice a week."));
    }
}
