use serde::{Deserialize, Serialize};

/// Housekeeping placeholder the backend keeps in its data volume; never a
/// selectable input.
pub const HOUSEKEEPING_LOG_NAME: &str = ".gitkeep";

/// Reserved namespace prefix for generated results. Matching is byte-exact
/// and case-sensitive.
pub const RESULTS_NAMESPACE_PREFIX: &str = "results";

/// One invocation step of the two-stage (plus stub) pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scan,
    Enrich,
    Stub,
}

impl Stage {
    /// Path segment under `/analyze/` on the backend.
    pub fn route(self) -> &'static str {
        match self {
            Stage::Scan => "scan",
            Stage::Enrich => "enrich",
            Stage::Stub => "stub",
        }
    }

    /// Backend tool that implements the stage.
    pub fn tool_name(self) -> &'static str {
        match self {
            Stage::Scan => "Hayabusa",
            Stage::Enrich => "Takajo",
            Stage::Stub => "Chainsaw",
        }
    }

    pub fn human_name(self) -> &'static str {
        match self {
            Stage::Scan => "Scan",
            Stage::Enrich => "Enrich",
            Stage::Stub => "Stub",
        }
    }
}

/// Raw response body of a successful stage invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub tool: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub command_run: Option<String>,
    #[serde(default)]
    pub output_location: Option<String>,
    /// `None` means the backend reported no listing at all; `Some(vec![])`
    /// means it reported zero files. The viewer renders these differently.
    #[serde(default)]
    pub generated_files: Option<Vec<String>>,
}

/// Outcome of one completed stage invocation, replaced wholesale by each new
/// run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub timestamp_utc: String,
    #[serde(flatten)]
    pub result: RunResult,
}

impl StageReport {
    pub fn new(stage: Stage, result: RunResult) -> Self {
        Self {
            stage,
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            result,
        }
    }
}

/// Tool inventory entry from `GET /tools`. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub name: String,
    pub exists: bool,
    #[serde(default)]
    pub path: Option<String>,
}

/// Drop reserved entries from a raw log listing before offering it as
/// selectable input.
pub fn filter_selectable_logs(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|n| n != HOUSEKEEPING_LOG_NAME && !n.starts_with(RESULTS_NAMESPACE_PREFIX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reserved_log_names_are_filtered() {
        let names = vec![
            "security.evtx".to_string(),
            ".gitkeep".to_string(),
            "results".to_string(),
            "results-2024-archive.evtx".to_string(),
            "system.evtx".to_string(),
        ];
        assert_eq!(
            filter_selectable_logs(names),
            vec!["security.evtx".to_string(), "system.evtx".to_string()]
        );
    }

    #[test]
    fn reserved_prefix_is_case_sensitive() {
        let names = vec!["Results.evtx".to_string()];
        assert_eq!(filter_selectable_logs(names.clone()), names);
    }

    #[test]
    fn absent_file_listing_is_distinct_from_empty() {
        let absent: RunResult = serde_json::from_value(serde_json::json!({
            "tool": "Chainsaw",
            "message": "stub executed",
        }))
        .unwrap();
        let empty: RunResult = serde_json::from_value(serde_json::json!({
            "tool": "Takajo",
            "message": "done",
            "generated_files": [],
        }))
        .unwrap();
        assert_eq!(absent.generated_files, None);
        assert_eq!(empty.generated_files, Some(vec![]));
    }

    #[test]
    fn stage_routes_match_backend() {
        assert_eq!(Stage::Scan.route(), "scan");
        assert_eq!(Stage::Enrich.route(), "enrich");
        assert_eq!(Stage::Stub.route(), "stub");
    }
}
