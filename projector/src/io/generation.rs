//! Generation service abstraction.
//!
//! The [`GenerationService`] trait decouples the orchestrator from the backend
//! that produces instruction payloads. [`HttpGenerationService`] talks to the
//! HTTP backend; tests use scripted services that return canned payloads.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::types::Message;

/// Response to the "produce initial scaffold" request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateResponse {
    /// Reusable context prompts, sent as user messages ahead of the user's prompt.
    #[serde(default)]
    pub prompts: Vec<String>,
    /// Instruction payloads describing the scaffold; the first one seeds the session.
    #[serde(default, rename = "uiPrompts")]
    pub ui_prompts: Vec<String>,
}

/// Abstraction over instruction-payload backends.
pub trait GenerationService {
    /// Request the initial scaffold plan for `prompt`.
    fn template(&self, prompt: &str) -> Result<TemplateResponse>;

    /// Request a follow-up instruction payload given the conversation so far.
    fn chat(&self, messages: &[Message]) -> Result<String>;
}

/// Which generation request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRequest {
    Template,
    Chat,
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Chat => f.write_str("chat"),
        }
    }
}

/// A generation request failed; no operations were produced by it.
#[derive(Debug)]
pub struct GenerationError {
    pub request: GenerationRequest,
    pub source: anyhow::Error,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} request failed: {:#}", self.request, self.source)
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

#[derive(Debug, Serialize)]
struct TemplateRequestBody<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    response: String,
}

/// Generation service reached over HTTP (`POST /template`, `POST /chat`).
pub struct HttpGenerationService {
    client: Client,
    base_url: String,
}

impl HttpGenerationService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

impl GenerationService for HttpGenerationService {
    #[instrument(skip_all, fields(prompt_bytes = prompt.len()))]
    fn template(&self, prompt: &str) -> Result<TemplateResponse> {
        let url = self.endpoint("template");
        debug!(url = %url, "requesting template");
        let response = self
            .client
            .post(&url)
            .json(&TemplateRequestBody { prompt })
            .send()
            .with_context(|| format!("send {url}"))?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "template request rejected");
        }
        let body: TemplateResponse = response
            .error_for_status()
            .with_context(|| format!("status from {url}"))?
            .json()
            .with_context(|| format!("decode {url}"))?;
        debug!(
            prompts = body.prompts.len(),
            ui_prompts = body.ui_prompts.len(),
            "template received"
        );
        Ok(body)
    }

    #[instrument(skip_all, fields(messages = messages.len()))]
    fn chat(&self, messages: &[Message]) -> Result<String> {
        let url = self.endpoint("chat");
        debug!(url = %url, "requesting follow-up");
        let response = self
            .client
            .post(&url)
            .json(&ChatRequestBody { messages })
            .send()
            .with_context(|| format!("send {url}"))?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "chat request rejected");
        }
        let body: ChatResponseBody = response
            .error_for_status()
            .with_context(|| format!("status from {url}"))?
            .json()
            .with_context(|| format!("decode {url}"))?;
        debug!(response_bytes = body.response.len(), "follow-up received");
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let service =
            HttpGenerationService::new("http://localhost:3000/", Duration::from_secs(1))
                .expect("client");
        assert_eq!(service.endpoint("chat"), "http://localhost:3000/chat");
    }

    #[test]
    fn template_response_reads_camel_case_ui_prompts() {
        let body = r#"{"prompts":["base"],"uiPrompts":["<a action=\"runCommand\">ls</a>"]}"#;
        let parsed: TemplateResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.prompts, vec!["base".to_string()]);
        assert_eq!(parsed.ui_prompts.len(), 1);
    }

    #[test]
    fn chat_body_serializes_role_tagged_messages() {
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let value = serde_json::to_value(ChatRequestBody {
            messages: &messages,
        })
        .expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"},
            ]})
        );
    }

    #[test]
    fn generation_error_exposes_request_and_source() {
        let err = GenerationError {
            request: GenerationRequest::Chat,
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(err.to_string(), "chat request failed: connection refused");
        assert!(std::error::Error::source(&err).is_some());
    }
}
