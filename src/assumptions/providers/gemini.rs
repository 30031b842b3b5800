//! Google Gemini assumption provider.
//!
//! Sends the rendered prompt to the `generateContent` endpoint and parses the
//! first candidate's text as a structured reply. Timeouts and retries are the
//! caller's concern (see [`crate::assumptions::CallPolicy`]).

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assumptions::parsing::parse_reply;
use crate::assumptions::prompt::prompt_for;
use crate::assumptions::{AssumptionProvider, ProviderError};
use crate::models::{AssumptionRequest, Assumptions};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

const ERROR_BODY_LIMIT: usize = 200;

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
    }
}

pub struct GeminiAssumptionProvider {
    api_key: SecretString,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiAssumptionProvider {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn generate(&self, prompt: String) -> Result<String, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text, &self.model));
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(format!("response body does not parse: {e}")))?;
        data.first_text()
            .ok_or_else(|| ProviderError::malformed("response has no candidate text"))
    }
}

fn status_error(status: StatusCode, body: &str, model: &str) -> ProviderError {
    let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    match status.as_u16() {
        429 => ProviderError::Server(format!("rate limited by Gemini ({model}): {snippet}")),
        500..=599 => ProviderError::Server(format!("Gemini HTTP {status}: {snippet}")),
        401 | 403 => ProviderError::Unavailable(format!("Gemini rejected the API key (HTTP {status})")),
        404 => ProviderError::Unavailable(format!("Gemini model {model} not found")),
        _ => ProviderError::Unavailable(format!("Gemini HTTP {status}: {snippet}")),
    }
}

#[async_trait::async_trait]
impl AssumptionProvider for GeminiAssumptionProvider {
    async fn assumptions(&self, request: &AssumptionRequest) -> Result<Assumptions, ProviderError> {
        let prompt = prompt_for(request);
        debug!(
            model = %self.model,
            kind = %request.kind,
            ticker = %request.summary.ticker,
            prompt_len = prompt.len(),
            "sending prompt to Gemini"
        );
        let reply = self.generate(prompt).await?;
        parse_reply(&reply, request)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
