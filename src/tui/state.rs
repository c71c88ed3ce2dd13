//! UI state for the console.
//!
//! Owned exclusively by the UI thread; the controller communicates through
//! events only. Page and tab selection are enums so illegal combinations
//! are unrepresentable.

use crate::classify::{classify, FileCategory};
use crate::model::{Stage, StageReport, ToolStatus};
use crate::orchestrator::UiCommand;
use crate::report::{file_kind, parse_table, results_directory, FileKind, TableData};

/// Top-level page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Setup,
    Results,
    Help,
}

/// Normalized view of a failed stage run. Mutually exclusive with a stored
/// report; the raw payload backs the expert view.
#[derive(Debug, Clone)]
pub struct RunErrorView {
    pub stage: Stage,
    pub message: String,
    pub raw: Option<serde_json::Value>,
}

/// Transient file selection inside the report view; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub directory: String,
    pub kind: FileKind,
}

/// Content pane for the selected file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileView {
    Loading,
    Plain(String),
    Table(TableData),
    /// Parse or fetch failure, scoped to this one file.
    Failed(String),
}

pub struct UiState {
    pub page: Page,
    pub info: String,
    pub expert: bool,

    pub backend_reachable: Option<bool>,
    pub tools: Vec<ToolStatus>,
    pub logs: Vec<String>,
    pub log_selected: usize,

    pub running: Option<Stage>,
    pub last_report: Option<StageReport>,
    pub run_error: Option<RunErrorView>,

    pub active_category: usize,
    pub file_selected: usize,
    pub selected_file: Option<SelectedFile>,
    pub file_view: Option<FileView>,
    /// Request token for stale-fetch suppression; only the most recently
    /// issued fetch may commit content.
    pub fetch_generation: u64,
    pub content_scroll: u16,
}

impl UiState {
    pub fn new(expert: bool) -> Self {
        Self {
            page: Page::Setup,
            info: String::new(),
            expert,
            backend_reachable: None,
            tools: Vec::new(),
            logs: Vec::new(),
            log_selected: 0,
            running: None,
            last_report: None,
            run_error: None,
            active_category: 0,
            file_selected: 0,
            selected_file: None,
            file_view: None,
            fetch_generation: 0,
            content_scroll: 0,
        }
    }

    /// Categories are computed, not stored: derived fresh from the current
    /// report's file listing on every use.
    pub fn categories(&self) -> Vec<FileCategory> {
        match self
            .last_report
            .as_ref()
            .and_then(|r| r.result.generated_files.as_deref())
        {
            Some(files) => classify(files),
            None => classify(&[]),
        }
    }

    /// A stage moved to Running: show the results view immediately so a
    /// loading indicator replaces any stale previous result.
    pub fn stage_started(&mut self, stage: Stage) {
        self.running = Some(stage);
        self.last_report = None;
        self.run_error = None;
        self.page = Page::Results;
        self.reset_report_view();
        self.info = format!("Running {} ({})…", stage.tool_name(), stage.human_name());
    }

    pub fn stage_succeeded(&mut self, report: StageReport) {
        self.running = None;
        self.run_error = None;
        self.last_report = Some(report);
        self.reset_report_view();
    }

    /// A stage failed. Precondition failures arrive without a preceding
    /// start event, so the results page is shown here too, not only in
    /// [`Self::stage_started`].
    pub fn stage_failed(&mut self, stage: Stage, message: String, raw: Option<serde_json::Value>) {
        self.running = None;
        self.last_report = None;
        self.run_error = Some(RunErrorView {
            stage,
            message,
            raw,
        });
        self.page = Page::Results;
        self.reset_report_view();
    }

    fn reset_report_view(&mut self) {
        self.active_category = 0;
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        self.file_selected = 0;
        self.selected_file = None;
        self.file_view = None;
        self.content_scroll = 0;
    }

    /// Switch to the category at `index`. Any selected file is cleared; no
    /// content leaks across a tab switch.
    pub fn switch_category(&mut self, index: usize) {
        let count = self.categories().len();
        let index = index.min(count.saturating_sub(1));
        if index == self.active_category {
            return;
        }
        self.active_category = index;
        self.clear_selection();
    }

    pub fn next_category(&mut self) {
        let count = self.categories().len();
        if count > 1 {
            self.switch_category((self.active_category + 1) % count);
        }
    }

    pub fn prev_category(&mut self) {
        let count = self.categories().len();
        if count > 1 {
            self.switch_category((self.active_category + count - 1) % count);
        }
    }

    pub fn move_file_selection(&mut self, delta: isize) {
        let categories = self.categories();
        let Some(category) = categories.get(self.active_category) else {
            return;
        };
        if category.files.is_empty() {
            return;
        }
        let last = category.files.len() - 1;
        self.file_selected = self
            .file_selected
            .saturating_add_signed(delta)
            .min(last);
    }

    /// Select the highlighted file and issue a lazy content fetch. Always
    /// re-fetches, even for a file viewed before: content is keyed by the
    /// `(directory, file_name)` pair, never cached.
    pub fn select_file(&mut self) -> Option<UiCommand> {
        let categories = self.categories();
        let category = categories.get(self.active_category)?;
        let name = category.files.get(self.file_selected)?.clone();
        let directory = self
            .last_report
            .as_ref()
            .and_then(|r| r.result.output_location.as_deref())
            .map(results_directory)?
            .to_string();

        self.fetch_generation += 1;
        self.selected_file = Some(SelectedFile {
            name: name.clone(),
            directory: directory.clone(),
            kind: file_kind(&name),
        });
        self.file_view = Some(FileView::Loading);
        self.content_scroll = 0;
        Some(UiCommand::FetchFile {
            generation: self.fetch_generation,
            directory,
            file_name: name,
        })
    }

    /// Commit fetched content if it still matches the current request.
    /// Results from superseded fetches or for a since-changed selection are
    /// discarded.
    pub fn commit_file_content(
        &mut self,
        generation: u64,
        directory: &str,
        file_name: &str,
        outcome: Result<String, String>,
    ) {
        if generation != self.fetch_generation {
            return;
        }
        let Some(selected) = self.selected_file.as_ref() else {
            return;
        };
        if selected.directory != directory || selected.name != file_name {
            return;
        }

        self.file_view = Some(match outcome {
            Ok(content) => match selected.kind {
                FileKind::Tabular => match parse_table(&content) {
                    Ok(table) => FileView::Table(table),
                    Err(e) => FileView::Failed(e.to_string()),
                },
                FileKind::Plain => FileView::Plain(content),
            },
            Err(message) => FileView::Failed(message),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunResult;
    use pretty_assertions::assert_eq;

    fn enrich_report() -> StageReport {
        StageReport::new(
            Stage::Enrich,
            RunResult {
                tool: "Takajo".into(),
                message: Some("done".into()),
                stdout: None,
                stderr: None,
                command_run: None,
                output_location: Some("/data/results/sec.evtx-takajo-analysis".into()),
                generated_files: Some(vec![
                    "metrics_users.csv".into(),
                    "list_ips.txt".into(),
                ]),
            },
        )
    }

    fn state_with_report() -> UiState {
        let mut state = UiState::new(false);
        state.stage_succeeded(enrich_report());
        state
    }

    #[test]
    fn running_makes_the_results_page_visible() {
        let mut state = UiState::new(false);
        assert_eq!(state.page, Page::Setup);
        state.stage_started(Stage::Scan);
        assert_eq!(state.page, Page::Results);
        assert_eq!(state.running, Some(Stage::Scan));
        assert!(state.last_report.is_none());
        assert!(state.run_error.is_none());
    }

    #[test]
    fn failure_without_a_start_still_shows_the_results_page() {
        // Precondition failures fire before the stage ever starts; the
        // error must still be put in front of the user.
        let mut state = UiState::new(false);
        assert_eq!(state.page, Page::Setup);
        state.stage_failed(
            Stage::Enrich,
            "run a successful scan before requesting enrichment".into(),
            None,
        );
        assert_eq!(state.page, Page::Results);
        assert!(state.run_error.is_some());
    }

    #[test]
    fn result_and_error_are_mutually_exclusive() {
        let mut state = state_with_report();
        state.stage_failed(Stage::Enrich, "boom".into(), None);
        assert!(state.last_report.is_none());
        assert!(state.run_error.is_some());

        state.stage_succeeded(enrich_report());
        assert!(state.last_report.is_some());
        assert!(state.run_error.is_none());
    }

    #[test]
    fn switching_tabs_clears_the_selected_file() {
        let mut state = state_with_report();
        state.switch_category(1);
        let cmd = state.select_file();
        assert!(cmd.is_some());
        assert!(state.selected_file.is_some());

        state.switch_category(2);
        assert_eq!(state.selected_file, None);
        assert_eq!(state.file_view, None);
        assert_eq!(state.file_selected, 0);
    }

    #[test]
    fn reselecting_a_file_reissues_the_fetch() {
        let mut state = state_with_report();
        state.switch_category(1);
        let first = state.select_file().unwrap();
        state.switch_category(2);
        state.switch_category(1);
        let second = state.select_file().unwrap();

        let gen_of = |cmd: &UiCommand| match cmd {
            UiCommand::FetchFile { generation, .. } => *generation,
            _ => panic!("expected a fetch command"),
        };
        assert!(gen_of(&second) > gen_of(&first));
    }

    #[test]
    fn stale_fetch_results_are_discarded() {
        let mut state = state_with_report();
        state.switch_category(1);
        let first = state.select_file().unwrap();
        // A newer fetch supersedes the first before it lands.
        let _second = state.select_file().unwrap();

        if let UiCommand::FetchFile {
            generation,
            directory,
            file_name,
        } = first
        {
            state.commit_file_content(generation, &directory, &file_name, Ok("a,b\n1,2\n".into()));
        }
        assert_eq!(state.file_view, Some(FileView::Loading));
    }

    #[test]
    fn committed_csv_content_is_parsed_as_a_table() {
        let mut state = state_with_report();
        state.switch_category(1);
        let cmd = state.select_file().unwrap();
        if let UiCommand::FetchFile {
            generation,
            directory,
            file_name,
        } = cmd
        {
            assert_eq!(directory, "sec.evtx-takajo-analysis");
            state.commit_file_content(
                generation,
                &directory,
                &file_name,
                Ok("a,b\n1,2\n3,4\n".into()),
            );
        }
        match state.file_view {
            Some(FileView::Table(ref t)) => assert_eq!(t.rows.len(), 2),
            ref other => panic!("expected table view, got {other:?}"),
        }
    }

    #[test]
    fn parse_failure_is_inline_and_local() {
        let mut state = state_with_report();
        state.switch_category(1);
        let cmd = state.select_file().unwrap();
        if let UiCommand::FetchFile {
            generation,
            directory,
            file_name,
        } = cmd
        {
            state.commit_file_content(generation, &directory, &file_name, Ok("".into()));
        }
        assert!(matches!(state.file_view, Some(FileView::Failed(_))));
        // The surrounding report is untouched.
        assert!(state.last_report.is_some());
        assert_eq!(state.categories().len(), 3);
    }

    #[test]
    fn summary_tab_has_no_selectable_files() {
        let mut state = state_with_report();
        assert_eq!(state.active_category, 0);
        assert!(state.select_file().is_none());
    }

    #[test]
    fn tab_set_collapses_to_summary_without_files() {
        let mut state = UiState::new(false);
        state.stage_succeeded(StageReport::new(
            Stage::Enrich,
            RunResult {
                tool: "Takajo".into(),
                message: None,
                stdout: None,
                stderr: None,
                command_run: None,
                output_location: Some("/data/results/x".into()),
                generated_files: Some(vec![]),
            },
        ));
        assert_eq!(state.categories().len(), 1);
        // Tab navigation cannot leave summary.
        state.next_category();
        assert_eq!(state.active_category, 0);
    }
}
