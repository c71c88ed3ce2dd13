//! Application-level orchestration.
//!
//! This module owns the pipeline state machine: which stage may run, what
//! input it needs, and how results and errors feed into the next stage.
//! UI/CLI layers drive it through commands and consume its events; they
//! never mutate pipeline state directly.

mod controller;

pub(crate) use controller::{run_controller, PipelineEvent, PipelineState, UiCommand};
