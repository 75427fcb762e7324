//! Survey generation over selected paper records.
//!
//! Serializes the selected records, appends them to the survey template and
//! sends one chat completion request to an OpenAI-compatible endpoint. The
//! returned text is passed through untouched. No retries, no streaming.

use crate::error::{PapersError, Result};
use crate::prompts::survey::{build_user_prompt, SYSTEM_PROMPT};
use crate::record::PaperRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default OpenAI-compatible API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for survey writing
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Survey service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub base_url: String,
    /// Supplied at runtime; never read from or written to the config file
    #[serde(skip)]
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 12000,
            timeout_secs: 600,
        }
    }
}

impl SurveyConfig {
    /// Chat completions endpoint under `base_url`
    fn endpoint(&self) -> Result<Url> {
        let raw = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| PapersError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))
    }
}

/// Token usage tracking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Generated survey text with the usage reported by the service
#[derive(Debug, Clone, Serialize)]
pub struct Survey {
    pub text: String,
    pub usage: TokenUsage,
}

/// OpenAI-compatible API response structures
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Build the chat messages for a set of records
pub fn build_messages(records: &[PaperRecord]) -> serde_json::Value {
    let serialized: Vec<String> = records.iter().map(PaperRecord::to_pretty_json).collect();
    serde_json::json!([
        {"role": "system", "content": SYSTEM_PROMPT},
        {"role": "user", "content": build_user_prompt(&serialized)}
    ])
}

/// Generate one survey from the selected records.
///
/// # Errors
///
/// * `Validation` - no records selected
/// * `Config` - malformed base URL
/// * `Service` - no API key to authenticate with
/// * `Network` / `Api` / `Service` - the request failed or the reply was unusable
pub async fn generate_survey(config: &SurveyConfig, records: &[PaperRecord]) -> Result<Survey> {
    if records.is_empty() {
        return Err(PapersError::Validation(
            "Please select at least one paper.".to_string(),
        ));
    }
    if config.api_key.trim().is_empty() {
        return Err(PapersError::Service(
            "An API key is required to generate surveys".to_string(),
        ));
    }
    let endpoint = config.endpoint()?;

    info!(
        count = records.len(),
        model = %config.model,
        "Generating survey"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| PapersError::Config(format!("Failed to build HTTP client: {}", e)))?;

    let request_body = serde_json::json!({
        "model": config.model,
        "messages": build_messages(records),
        "temperature": config.temperature,
        "max_tokens": config.max_tokens
    });

    debug!(endpoint = %endpoint, "Sending survey request");

    let response = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&request_body)
        .send()
        .await
        .map_err(PapersError::Network)?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(PapersError::Api {
            code: status.as_u16(),
            message: format!("Survey API error: {} - {}", status, error_text),
        });
    }

    let api_response: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| PapersError::Service(format!("Failed to parse survey response: {}", e)))?;

    let usage = api_response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    let text = api_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .ok_or_else(|| PapersError::Service("Survey response contained no text".to_string()))?;

    info!(
        chars = text.len(),
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        "Survey generated"
    );

    Ok(Survey { text, usage })
}
