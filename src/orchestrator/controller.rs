//! Pipeline lifecycle controller.
//!
//! Owns the single in-flight stage invocation and the state carried between
//! stages, and emits events for presentation layers.

use crate::backend::AnalysisBackend;
use crate::error::StageError;
use crate::model::{RunResult, Stage, StageReport, ToolStatus};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands emitted by UI/CLI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    RunScan { log_file: String },
    RunEnrich,
    RunStub { log_file: String },
    RefreshLogs,
    /// Lazy fetch of one generated file. `generation` is the caller's
    /// request token; it is echoed back so stale responses can be dropped.
    FetchFile {
        generation: u64,
        directory: String,
        file_name: String,
    },
    Quit,
}

/// Events emitted back to presentation layers.
#[derive(Debug, Clone)]
pub(crate) enum PipelineEvent {
    BackendStatus { reachable: bool, message: String },
    ToolsLoaded(Vec<ToolStatus>),
    LogsLoaded(Vec<String>),
    StageStarted(Stage),
    StageSucceeded(StageReport),
    StageFailed {
        stage: Stage,
        message: String,
        raw: Option<serde_json::Value>,
    },
    FileLoaded {
        generation: u64,
        directory: String,
        file_name: String,
        content: String,
    },
    FileLoadFailed {
        generation: u64,
        directory: String,
        file_name: String,
        message: String,
    },
    Info(String),
}

/// State carried across stage invocations.
///
/// The carried output location is the sole gate for the enrich stage: set by
/// a successful scan, cleared by a failed one, and untouched by everything
/// else.
#[derive(Debug, Default)]
pub(crate) struct PipelineState {
    last_enrich_output_location: Option<String>,
    running: Option<Stage>,
}

impl PipelineState {
    pub(crate) fn running(&self) -> Option<Stage> {
        self.running
    }

    /// Guard for starting `stage`; checked before any external call. Returns
    /// the backend input on success.
    pub(crate) fn admit(
        &self,
        stage: Stage,
        log_file: Option<&str>,
    ) -> Result<String, StageError> {
        match stage {
            Stage::Scan | Stage::Stub => match log_file {
                Some(f) if !f.trim().is_empty() => Ok(f.to_string()),
                _ => Err(StageError::Precondition(
                    "no log file selected".to_string(),
                )),
            },
            Stage::Enrich => self.last_enrich_output_location.clone().ok_or_else(|| {
                StageError::Precondition(
                    "run a successful scan before requesting enrichment".to_string(),
                )
            }),
        }
    }

    pub(crate) fn begin(&mut self, stage: Stage) {
        self.running = Some(stage);
    }

    /// Fold a finished invocation back into the carried state. Only the scan
    /// stage may set or clear the enrichment gate.
    pub(crate) fn observe(&mut self, stage: Stage, outcome: &Result<RunResult, StageError>) {
        self.running = None;
        if stage == Stage::Scan {
            self.last_enrich_output_location = match outcome {
                Ok(r) => r.output_location.clone(),
                Err(_) => None,
            };
        }
    }
}

/// Handle for the single in-flight stage invocation.
struct StageTask {
    stage: Stage,
    handle: JoinHandle<Result<RunResult, StageError>>,
}

fn start_stage<B: AnalysisBackend + ?Sized + 'static>(
    backend: &Arc<B>,
    stage: Stage,
    input: String,
) -> StageTask {
    let backend = Arc::clone(backend);
    let handle = tokio::spawn(async move { backend.run_stage(stage, &input).await });
    StageTask { stage, handle }
}

async fn refresh_logs<B: AnalysisBackend + ?Sized>(
    backend: &B,
    event_tx: &UnboundedSender<PipelineEvent>,
) {
    match backend.list_logs().await {
        Ok(logs) => {
            let _ = event_tx.send(PipelineEvent::LogsLoaded(logs));
        }
        Err(e) => {
            let _ = event_tx.send(PipelineEvent::Info(format!("log listing failed: {e:#}")));
        }
    }
}

/// Drive the pipeline based on UI commands and emit events back.
///
/// At most one stage invocation is in flight at a time; a stage command
/// arriving while one is running is dropped, never queued. File fetches are
/// independent of stage invocations and of each other.
pub(crate) async fn run_controller<B: AnalysisBackend + ?Sized + 'static>(
    backend: Arc<B>,
    event_tx: UnboundedSender<PipelineEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut state = PipelineState::default();
    let mut stage_task: Option<StageTask> = None;
    let mut quit_pending = false;

    // Initial handshake: liveness, tool inventory, input listing.
    match backend.health().await {
        Ok(()) => {
            let _ = event_tx.send(PipelineEvent::BackendStatus {
                reachable: true,
                message: "backend reachable".to_string(),
            });
        }
        Err(e) => {
            let _ = event_tx.send(PipelineEvent::BackendStatus {
                reachable: false,
                message: format!("{e:#}"),
            });
        }
    }
    if let Ok(tools) = backend.list_tools().await {
        let _ = event_tx.send(PipelineEvent::ToolsLoaded(tools));
    }
    refresh_logs(&*backend, &event_tx).await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let requested = match cmd {
                    Some(UiCommand::Quit) | None => {
                        // Wait for the in-flight stage so its outcome is observed.
                        if stage_task.is_none() {
                            break;
                        }
                        quit_pending = true;
                        None
                    }
                    Some(UiCommand::RefreshLogs) => {
                        refresh_logs(&*backend, &event_tx).await;
                        None
                    }
                    Some(UiCommand::FetchFile { generation, directory, file_name }) => {
                        let backend = Arc::clone(&backend);
                        let tx = event_tx.clone();
                        tokio::spawn(async move {
                            match backend.fetch_result_file(&directory, &file_name).await {
                                Ok(content) => {
                                    let _ = tx.send(PipelineEvent::FileLoaded {
                                        generation, directory, file_name, content,
                                    });
                                }
                                Err(e) => {
                                    let _ = tx.send(PipelineEvent::FileLoadFailed {
                                        generation, directory, file_name,
                                        message: e.to_string(),
                                    });
                                }
                            }
                        });
                        None
                    }
                    Some(UiCommand::RunScan { log_file }) => Some((Stage::Scan, Some(log_file))),
                    Some(UiCommand::RunEnrich) => Some((Stage::Enrich, None)),
                    Some(UiCommand::RunStub { log_file }) => Some((Stage::Stub, Some(log_file))),
                };

                if let Some((stage, log_file)) = requested {
                    if state.running().is_some() {
                        // The control surface disables triggers while a stage
                        // runs; a command that slips through is dropped, not
                        // queued.
                        let _ = event_tx.send(PipelineEvent::Info(
                            "a stage is already running".to_string(),
                        ));
                    } else {
                        match state.admit(stage, log_file.as_deref()) {
                            Ok(input) => {
                                state.begin(stage);
                                tracing::info!(stage = stage.human_name(), "stage started");
                                let _ = event_tx.send(PipelineEvent::StageStarted(stage));
                                stage_task = Some(start_stage(&backend, stage, input));
                            }
                            Err(e) => {
                                let _ = event_tx.send(PipelineEvent::StageFailed {
                                    stage,
                                    message: e.to_string(),
                                    raw: None,
                                });
                            }
                        }
                    }
                }
            }
            // Await the in-flight stage without taking the handle; see the
            // pending() arm for the idle case.
            join_res = async {
                match stage_task.as_mut() {
                    Some(task) => (&mut task.handle).await,
                    None => futures::future::pending().await,
                }
            } => {
                let Some(task) = stage_task.take() else { continue };
                let stage = task.stage;
                let outcome = match join_res {
                    Ok(outcome) => outcome,
                    Err(e) => Err(StageError::Transport(format!("stage task failed: {e}"))),
                };
                state.observe(stage, &outcome);
                match outcome {
                    Ok(result) => {
                        tracing::info!(stage = stage.human_name(), "stage succeeded");
                        let _ = event_tx.send(PipelineEvent::StageSucceeded(
                            StageReport::new(stage, result),
                        ));
                    }
                    Err(err) => {
                        tracing::warn!(stage = stage.human_name(), error = %err, "stage failed");
                        let raw = err.raw_detail().cloned();
                        let _ = event_tx.send(PipelineEvent::StageFailed {
                            stage,
                            message: err.to_string(),
                            raw,
                        });
                    }
                }
                if quit_pending {
                    break;
                }
            }
        }
    }

    Ok(())
}
