pub mod parse;

use log::{info, warn};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Serialize, Deserialize};

use crate::config::OracleConfig;
use crate::error::{AppError, Result};
use crate::interview::{Evaluation, QuestionAnswer, QUESTIONS_PER_SESSION};

/// Seam between the session state machine and the hosted language-model
/// gateway. The production implementation is [`OracleClient`]; tests plug in
/// scripted stand-ins.
#[allow(async_fn_in_trait)]
pub trait QuestionOracle {
    async fn generate_questions(
        &self,
        role: &str,
        resume_hint: Option<&str>,
        exclude: &[String],
    ) -> Result<Vec<String>>;

    async fn evaluate_answers(
        &self,
        role: &str,
        transcript: &[QuestionAnswer],
    ) -> Result<Vec<Evaluation>>;

    async fn generate_coaching(&self, role: &str, evaluations: &[Evaluation]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// HTTP client for the language-model gateway. One instance per process,
/// cheap to clone (reqwest pools connections internally).
#[derive(Clone)]
pub struct OracleClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OracleClient {
    pub fn new(config: &OracleConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Map a non-success gateway status onto the error taxonomy. Rate-limit
    /// and quota conditions stay distinct so the UI can phrase them; every
    /// other failure collapses into a generic oracle error.
    fn error_for_status(status: StatusCode) -> AppError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => AppError::QuotaExhausted,
            other => AppError::Oracle(format!("gateway returned HTTP {}", other)),
        }
    }

    async fn chat(&self, system: &str, prompt: &str, temperature: f64) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            max_tokens: 1200,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Oracle(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response.status()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Oracle(format!("malformed gateway response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Oracle("gateway response had no choices".to_string()))
    }
}

impl QuestionOracle for OracleClient {
    /// Ask the gateway for exactly five interview questions. A random
    /// variety seed and elevated temperature bias the model away from
    /// repeating itself across sessions; the same seed also selects the
    /// canned fallback set when the reply cannot be parsed.
    async fn generate_questions(
        &self,
        role: &str,
        resume_hint: Option<&str>,
        exclude: &[String],
    ) -> Result<Vec<String>> {
        let seed: u32 = rand::thread_rng().gen();

        let mut prompt = format!(
            "Generate exactly {} interview questions for a {} position.\n\
             Variety seed: {}. Use it to vary topic order and phrasing.\n\
             Return ONLY a JSON array of {} question strings, no other text.",
            QUESTIONS_PER_SESSION, role, seed, QUESTIONS_PER_SESSION
        );
        if let Some(hint) = resume_hint {
            prompt.push_str(&format!("\nCandidate resume summary: {}", hint));
        }
        if !exclude.is_empty() {
            prompt.push_str(&format!(
                "\nDo not repeat any of these previously asked questions:\n{}",
                exclude.join("\n")
            ));
        }

        info!("Requesting {} questions for role '{}' (seed {})", QUESTIONS_PER_SESSION, role, seed);

        let content = self
            .chat("You are an experienced technical interviewer.", &prompt, 0.9)
            .await?;

        let questions = parse::questions_from_reply(&content, seed);
        if questions == parse::canned_questions(seed) {
            warn!("Oracle question reply was unparseable; using canned set {}", seed % 3);
        }
        Ok(questions)
    }

    /// Score every answer of the transcript. The reply is forced to the
    /// transcript's length at the parse boundary, so callers can zip it
    /// against their questions without checking.
    async fn evaluate_answers(
        &self,
        role: &str,
        transcript: &[QuestionAnswer],
    ) -> Result<Vec<Evaluation>> {
        let qa_block = transcript
            .iter()
            .enumerate()
            .map(|(i, qa)| format!("{}. Q: {}\n   A: {}", i + 1, qa.question, qa.answer))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Evaluate each answer from a mock interview for a {} position.\n{}\n\
             For every item return relevance, clarity, grammar and confidence as numbers \
             from 0 to 100, plus one short feedback sentence.\n\
             Return ONLY a JSON array of {} objects with keys \
             relevance, clarity, grammar, confidence, feedback - in the same order as the items.",
            role,
            qa_block,
            transcript.len()
        );

        info!("Requesting evaluation of {} answers for role '{}'", transcript.len(), role);

        let content = self
            .chat("You are a strict but fair interview assessor.", &prompt, 0.2)
            .await?;

        Ok(parse::evaluations_from_reply(&content, transcript.len()))
    }

    /// Turn the per-answer feedback into a short coaching summary. Parse
    /// issues degrade to a canned paragraph, never to an error.
    async fn generate_coaching(&self, role: &str, evaluations: &[Evaluation]) -> Result<String> {
        let feedback_block = evaluations
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, e.feedback))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "A candidate just finished a mock interview for a {} position. \
             Per-answer feedback:\n{}\n\
             Write a short, encouraging coaching paragraph with the two most \
             impactful things to improve.",
            role, feedback_block
        );

        let content = self
            .chat("You are a supportive interview coach.", &prompt, 0.7)
            .await?;

        if content.trim().is_empty() {
            return Ok(
                "Solid effort overall. Focus on structuring answers with a concrete \
                 situation, your actions, and the result, and practice speaking at a \
                 steady, confident pace."
                    .to_string(),
            );
        }
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_distinct_for_rate_and_quota() {
        assert!(matches!(
            OracleClient::error_for_status(StatusCode::TOO_MANY_REQUESTS),
            AppError::RateLimited
        ));
        assert!(matches!(
            OracleClient::error_for_status(StatusCode::PAYMENT_REQUIRED),
            AppError::QuotaExhausted
        ));
        assert!(matches!(
            OracleClient::error_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::Oracle(_)
        ));
        assert!(matches!(
            OracleClient::error_for_status(StatusCode::BAD_REQUEST),
            AppError::Oracle(_)
        ));
    }
}
