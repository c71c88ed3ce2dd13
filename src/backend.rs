//! HTTP client for the workbench backend.
//!
//! Everything the console knows about the server goes through
//! [`AnalysisBackend`]; the state machine and the viewer never touch the
//! transport directly. The backend itself is an opaque collaborator that
//! runs the external tools as subprocesses.

use crate::error::StageError;
use crate::model::{filter_selectable_logs, RunResult, Stage, ToolStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

/// Connection settings for the workbench backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

/// Narrow interface to the analysis backend.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Liveness probe; any non-error response means the backend is reachable.
    async fn health(&self) -> Result<()>;

    /// Tool inventory. Informational only, never consumed by the state
    /// machine.
    async fn list_tools(&self) -> Result<Vec<ToolStatus>>;

    /// Selectable input logs, already stripped of reserved entries.
    async fn list_logs(&self) -> Result<Vec<String>>;

    /// Invoke one pipeline stage. `input` is the log file name for scan and
    /// stub, and the prior stage's output location for enrich.
    async fn run_stage(&self, stage: Stage, input: &str) -> Result<RunResult, StageError>;

    /// Raw text content of one generated file.
    async fn fetch_result_file(
        &self,
        directory: &str,
        file_name: &str,
    ) -> Result<String, StageError>;
}

/// Scan and stub stages take a log file.
#[derive(Serialize)]
struct LogRequest<'a> {
    log_file: &'a str,
}

/// The enrich stage consumes the scan stage's report file.
#[derive(Serialize)]
struct EnrichRequest<'a> {
    hayabusa_report_file: &'a str,
}

/// reqwest-backed implementation of [`AnalysisBackend`].
pub struct HttpBackend {
    http: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .connect_timeout(cfg.connect_timeout)
            .build()
            .context("build http client")?;
        let base = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid base url: {}", cfg.base_url))?;
        Ok(Self { http, base })
    }

    /// Join opaque path segments onto the base URL. `push` percent-encodes
    /// each segment, which is what the backend expects for directory and
    /// file identifiers.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StageError> {
        let mut url = self.base.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|()| StageError::Transport("base url cannot carry a path".into()))?;
            parts.pop_if_empty();
            for s in segments {
                parts.push(s);
            }
        }
        Ok(url)
    }
}

fn transport(e: reqwest::Error) -> StageError {
    StageError::Transport(e.to_string())
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn health(&self) -> Result<()> {
        let resp = self
            .http
            .get(self.base.clone())
            .send()
            .await
            .context("backend unreachable")?;
        resp.error_for_status().context("health check failed")?;
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolStatus>> {
        let url = self.endpoint(&["tools"]).map_err(anyhow::Error::new)?;
        let tools = self
            .http
            .get(url)
            .send()
            .await
            .context("request tool inventory")?
            .error_for_status()
            .context("tool inventory failed")?
            .json::<Vec<ToolStatus>>()
            .await
            .context("decode tool inventory")?;
        Ok(tools)
    }

    async fn list_logs(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["logs"]).map_err(anyhow::Error::new)?;
        let names = self
            .http
            .get(url)
            .send()
            .await
            .context("request log listing")?
            .error_for_status()
            .context("log listing failed")?
            .json::<Vec<String>>()
            .await
            .context("decode log listing")?;
        Ok(filter_selectable_logs(names))
    }

    async fn run_stage(&self, stage: Stage, input: &str) -> Result<RunResult, StageError> {
        let url = self.endpoint(&["analyze", stage.route()])?;
        tracing::debug!(stage = stage.human_name(), %url, "invoking stage");

        let req = self.http.post(url);
        let resp = match stage {
            Stage::Enrich => req.json(&EnrichRequest {
                hayabusa_report_file: input,
            }),
            Stage::Scan | Stage::Stub => req.json(&LogRequest { log_file: input }),
        }
        .send()
        .await
        .map_err(transport)?;

        let status = resp.status();
        if status.is_success() {
            resp.json::<RunResult>()
                .await
                .map_err(|e| StageError::Transport(format!("invalid response body: {e}")))
        } else {
            // Non-2xx responses carry the structured error payload; keep it
            // raw and let the caller normalize for display.
            let raw = resp
                .json::<serde_json::Value>()
                .await
                .unwrap_or_else(|_| serde_json::Value::String(format!("HTTP {status}")));
            tracing::warn!(stage = stage.human_name(), %status, "stage reported failure");
            Err(StageError::Tool(raw))
        }
    }

    async fn fetch_result_file(
        &self,
        directory: &str,
        file_name: &str,
    ) -> Result<String, StageError> {
        let url = self.endpoint(&["results_file", directory, file_name])?;
        let resp = self.http.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let raw = resp
                .json::<serde_json::Value>()
                .await
                .unwrap_or_else(|_| serde_json::Value::String(format!("HTTP {status}")));
            return Err(StageError::Tool(raw));
        }
        resp.text().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: base.to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            user_agent: "test".into(),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_percent_encodes_opaque_segments() {
        let b = backend("http://localhost:8000");
        let url = b
            .endpoint(&["results_file", "sec.evtx-takajo-analysis", "sub/metrics a.csv"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/results_file/sec.evtx-takajo-analysis/sub%2Fmetrics%20a.csv"
        );
    }

    #[test]
    fn endpoint_handles_trailing_slash_in_base() {
        let b = backend("http://localhost:8000/");
        let url = b.endpoint(&["logs"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/logs");
    }

    #[test]
    fn wire_bodies_use_backend_field_names() {
        let scan = serde_json::to_value(LogRequest {
            log_file: "sec.evtx",
        })
        .unwrap();
        assert_eq!(scan, serde_json::json!({"log_file": "sec.evtx"}));

        let enrich = serde_json::to_value(EnrichRequest {
            hayabusa_report_file: "/data/results/sec.evtx-hayabusa-report.jsonl",
        })
        .unwrap();
        assert_eq!(
            enrich,
            serde_json::json!({"hayabusa_report_file": "/data/results/sec.evtx-hayabusa-report.jsonl"})
        );
    }
}
