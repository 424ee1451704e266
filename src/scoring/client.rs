//! Chat-completions client used to score companies.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::scoring::prompt::{parse_assessment, user_prompt, Assessment, SYSTEM_PROMPT};
use crate::scoring::{ScoringError, ScoringResult};
use crate::store::types::Company;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Scores companies through an OpenAI-compatible provider.
#[derive(Clone)]
pub struct ScoringClient {
    http: Client,
    config: ScoringConfig,
}

impl ScoringClient {
    pub fn new(http: Client, config: ScoringConfig) -> Self {
        Self { http, config }
    }

    /// Ask the model for a fresh score of `company`.
    pub async fn assess(&self, company: &Company) -> ScoringResult<Assessment> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ScoringError::NotConfigured("OPENAI_API_KEY"))?;

        let prompt = user_prompt(company);
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::Parse(e.to_string()))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ScoringError::Parse("response contained no message".to_string()))?;

        let assessment = parse_assessment(&content)?;
        tracing::debug!(
            company_id = %company.id,
            model = %self.config.model,
            score = assessment.score,
            "Company assessed"
        );
        Ok(assessment)
    }
}

impl std::fmt::Debug for ScoringClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringClient")
            .field("api_base", &self.config.api_base)
            .field("model", &self.config.model)
            .finish()
    }
}
