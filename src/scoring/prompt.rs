//! Prompt construction and reply parsing for ethics scoring.

use serde_json::Value;

use crate::scoring::ScoringError;
use crate::store::types::{check_score, Company};

pub const SYSTEM_PROMPT: &str = "You are an AI agent designed to assess the ethical practices of \
companies. You score companies on a scale from 0 to 100, where higher scores indicate better \
ethical performance. Your evaluation should consider factors such as environmental \
sustainability, labor practices, corporate governance, data privacy, and social impact.";

/// A parsed score with its rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub score: i32,
    pub reason: String,
}

/// User message describing the company to score.
pub fn user_prompt(company: &Company) -> String {
    let mut prompt = format!("Company name: {}.", company.name);
    if let Some(ticker) = company.ticker.as_deref().filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(" Ticker: {}.", ticker));
    }
    if let Some(previous) = company.ethics_score {
        prompt.push_str(&format!(" Previous ethics score: {}.", previous));
    }
    prompt.push_str(
        " Provide a JSON object with two keys: 'score' (an integer between 0 and 100) \
         and 'reason' (a brief explanation of why you assigned this score). \
         The explanation should be concise (no more than 100 words) and written in plain English.",
    );
    prompt
}

/// Parse the model's reply into an [`Assessment`].
///
/// Tolerates a surrounding markdown code fence. `score` may arrive as an
/// integer, a float (truncated) or a numeric string.
pub fn parse_assessment(content: &str) -> Result<Assessment, ScoringError> {
    let json = strip_code_fence(content);
    let data: Value = serde_json::from_str(json)
        .map_err(|e| ScoringError::Parse(format!("{}. Response: {}", e, content)))?;

    let score = match data.get("score") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        _ => None,
    }
    .ok_or_else(|| ScoringError::Parse(format!("missing or non-numeric 'score'. Response: {}", content)))?;

    let score = i32::try_from(score)
        .map_err(|_| ScoringError::Parse(format!("score {} out of range", score)))?;
    check_score(score).map_err(ScoringError::Parse)?;

    let reason = match data.get("reason") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => {
            return Err(ScoringError::Parse(format!("missing 'reason'. Response: {}", content)))
        }
        Some(other) => other.to_string(),
    };

    Ok(Assessment { score, reason })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence.
    let inner = match inner.find('\n') {
        Some(idx) => &inner[idx + 1..],
        None => inner,
    };
    inner.trim_end().trim_end_matches("```").trim()
}
