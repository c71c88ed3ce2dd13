//! Text summary builder for headless output.

use crate::classify::classify;
use crate::model::{Stage, StageReport};

/// Pre-formatted lines for text mode.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a human-readable summary of completed stage runs.
pub(crate) fn build_text_summary(reports: &[StageReport]) -> TextSummary {
    let mut lines = Vec::new();

    for report in reports {
        lines.push(format!(
            "== {} ({}) ==",
            report.result.tool,
            report.stage.human_name()
        ));
        if let Some(msg) = report.result.message.as_deref() {
            lines.push(msg.to_string());
        }
        if let Some(loc) = report.result.output_location.as_deref() {
            lines.push(format!("Output: {loc}"));
        }

        if report.stage == Stage::Enrich {
            match report.result.generated_files.as_deref() {
                None => lines.push("Generated files: not reported".to_string()),
                Some([]) => lines.push("Generated files: none".to_string()),
                Some(files) => {
                    lines.push(format!("Generated files: {}", files.len()));
                    for category in classify(files).iter().skip(1) {
                        lines.push(format!("  {}: {}", category.label, category.files.len()));
                    }
                }
            }
        }
        lines.push(String::new());
    }

    TextSummary { lines }
}
