use crate::backend::{AnalysisBackend, BackendConfig, HttpBackend};
use crate::model::{Stage, StageReport};
use crate::orchestrator::PipelineState;
use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "dfir-workbench-cli",
    version,
    about = "Console for the DFIR workbench analysis pipeline, with optional TUI"
)]
pub struct Cli {
    /// Base URL of the workbench backend
    #[arg(long, default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Run scan + enrich for --log-file, print the report as JSON, and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Run scan + enrich for --log-file, print a text summary, and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Input log file for headless modes
    #[arg(long)]
    pub log_file: Option<String>,

    /// Per-request timeout (analysis runs can be slow)
    #[arg(long, default_value = "10m")]
    pub request_timeout: humantime::Duration,

    /// Connection timeout
    #[arg(long, default_value = "10s")]
    pub connect_timeout: humantime::Duration,

    /// Override the User-Agent header sent to the backend
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Start the TUI with raw tool error payloads visible
    #[arg(long)]
    pub expert: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    let headless = args.silent || args.json || args.text;
    if headless {
        // The TUI owns the terminal; structured logging is headless-only.
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    if args.silent {
        return run_pipeline(args, Output::Silent).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_pipeline(args, Output::Text).await;
        }
    }

    if args.json {
        return run_pipeline(args, Output::Json).await;
    }

    run_pipeline(args, Output::Text).await
}

/// Build backend connection settings from CLI arguments.
pub fn build_config(args: &Cli) -> BackendConfig {
    BackendConfig {
        base_url: args.base_url.clone(),
        request_timeout: Duration::from(args.request_timeout),
        connect_timeout: Duration::from(args.connect_timeout),
        user_agent: args
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("dfir-workbench-cli/{}", env!("CARGO_PKG_VERSION"))),
    }
}

enum Output {
    Json,
    Text,
    Silent,
}

/// One-shot headless pipeline: scan the given log, then enrich the scan
/// report. Goes through the same state transitions as the interactive
/// console, so the enrichment guard and the carried output location behave
/// identically.
async fn run_pipeline(args: Cli, output: Output) -> Result<()> {
    let log_file = args
        .log_file
        .clone()
        .context("--log-file is required for headless modes")?;
    let backend = HttpBackend::new(&build_config(&args))?;
    backend.health().await.context("backend unreachable")?;

    let mut pipeline = PipelineState::default();

    let scan_input = pipeline
        .admit(Stage::Scan, Some(&log_file))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    pipeline.begin(Stage::Scan);
    let scan_outcome = backend.run_stage(Stage::Scan, &scan_input).await;
    pipeline.observe(Stage::Scan, &scan_outcome);
    let scan = StageReport::new(
        Stage::Scan,
        scan_outcome.map_err(|e| anyhow::anyhow!("scan failed: {e}"))?,
    );

    let enrich_input = pipeline
        .admit(Stage::Enrich, None)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    pipeline.begin(Stage::Enrich);
    let enrich_outcome = backend.run_stage(Stage::Enrich, &enrich_input).await;
    pipeline.observe(Stage::Enrich, &enrich_outcome);
    let enrich = StageReport::new(
        Stage::Enrich,
        enrich_outcome.map_err(|e| anyhow::anyhow!("enrichment failed: {e}"))?,
    );

    match output {
        Output::Json => {
            let out = serde_json::to_string_pretty(&serde_json::json!({
                "scan": scan,
                "enrich": enrich,
            }))?;
            println!("{out}");
        }
        Output::Text => {
            for line in crate::text_summary::build_text_summary(&[scan, enrich]).lines {
                println!("{line}");
            }
        }
        Output::Silent => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_agent_defaults_to_the_crate_version_and_can_be_overridden() {
        let mut args = Cli::parse_from(["dfir-workbench-cli"]);
        assert_eq!(
            build_config(&args).user_agent,
            format!("dfir-workbench-cli/{}", env!("CARGO_PKG_VERSION"))
        );

        args = Cli::parse_from(["dfir-workbench-cli", "--user-agent", "soc-automation/2"]);
        assert_eq!(build_config(&args).user_agent, "soc-automation/2");
    }

    #[test]
    fn timeouts_flow_into_the_backend_config() {
        let args = Cli::parse_from([
            "dfir-workbench-cli",
            "--request-timeout",
            "30s",
            "--connect-timeout",
            "2s",
        ]);
        let cfg = build_config(&args);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(2));
    }
}
