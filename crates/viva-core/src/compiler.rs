use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_COMPILER_ENDPOINT: &str = "https://try.lokad.com/w/script/trycompile";

/// One compiler message as reported by the remote service.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileDiagnostic {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Line", default)]
    pub line: i64,
    #[serde(rename = "Start", default)]
    pub start: i64,
    #[serde(rename = "Length", default)]
    pub length: i64,
    #[serde(rename = "Severity", default)]
    pub severity: String,
}

/// Result of one compile attempt. The gate never errors: an unreachable
/// service fails closed and the orchestrator retries.
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    Ok,
    /// Compiler ran and rejected the script. Carries only the first
    /// diagnostic even when several were reported; all of them are logged.
    Rejected { first: Option<CompileDiagnostic> },
    /// Network failure, timeout or non-200 response.
    Unreachable { detail: String },
}

impl CompileOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CompileOutcome::Ok)
    }
}

#[async_trait]
pub trait CompileService: Send + Sync {
    async fn check(&self, script: &str) -> CompileOutcome;

    fn service_name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct CompileReply {
    #[serde(rename = "IsCompOk")]
    is_comp_ok: bool,
    #[serde(rename = "CompMessages", default)]
    comp_messages: Vec<CompileDiagnostic>,
}

pub struct RemoteCompiler {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteCompiler {
    pub fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }

    async fn submit(&self, script: &str) -> anyhow::Result<CompileReply> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "Script": script }))
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("compilation service returned status {}", resp.status());
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CompileService for RemoteCompiler {
    async fn check(&self, script: &str) -> CompileOutcome {
        match self.submit(script).await {
            Ok(reply) => outcome_from_reply(reply),
            Err(e) => {
                tracing::warn!(error = %e, "unable to reach the compilation service");
                CompileOutcome::Unreachable {
                    detail: e.to_string(),
                }
            }
        }
    }

    fn service_name(&self) -> &'static str {
        "lokad-try"
    }
}

fn outcome_from_reply(reply: CompileReply) -> CompileOutcome {
    if reply.is_comp_ok {
        return CompileOutcome::Ok;
    }
    for message in &reply.comp_messages {
        tracing::warn!(
            text = %message.text,
            line = message.line,
            start = message.start,
            length = message.length,
            severity = %message.severity,
            "compilation failed"
        );
    }
    CompileOutcome::Rejected {
        first: reply.comp_messages.into_iter().next(),
    }
}

/// Strips the markdown fence around a generated snippet: drops the first and
/// last lines when the answer opens with a fence, as coder models reliably
/// wrap code in ```` ```envision ```` blocks. Unfenced answers pass through.
pub fn extract_code(candidate_answer: &str) -> String {
    let trimmed = candidate_answer.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let lines: Vec<&str> = trimmed.split('\n').collect();
    let body = &lines[1..];
    let body = match body.last() {
        Some(last) if last.trim_end() == "```" => &body[..body.len() - 1],
        _ => body,
    };
    body.join("\n")
}
