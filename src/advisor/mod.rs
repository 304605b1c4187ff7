//! Generative farming advisor.
//!
//! Prompt-templated client for a Gemini-style `generateContent` REST
//! surface. The prompt asks for localized farming advice in the caller's
//! language, switching to short bullet points when the message contains a
//! concise-mode trigger phrase.

mod cache;

pub use cache::{CacheConfig, ReplyCache};

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{AgrogateError, Result};
use crate::telemetry;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Phrases that switch the advisor into short bullet-point replies.
const CONCISE_TRIGGERS: [&str; 8] = [
    "decrease the matter",
    "reduce the matter",
    "make it short",
    "shorten",
    "in brief",
    "bullet points",
    "summarize",
    "short reply",
];

/// Client for the remote generative-language API.
pub struct AdvisorClient {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
    cache: Option<ReplyCache>,
}

impl AdvisorClient {
    /// Create a new advisor client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            cache: None,
        }
    }

    /// Override the generative model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Enable the reply cache.
    pub fn with_cache(mut self, config: &CacheConfig) -> Self {
        self.cache = Some(ReplyCache::new(config));
        self
    }

    /// Generate advice for `message`, replying in `language`.
    pub async fn generate(&self, message: &str, language: &str) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(reply) = cache.get(&self.model, message, language).await {
                return Ok(reply);
            }
        }

        let result = self.generate_uncached(message, language).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::ADVISOR_REQUESTS_TOTAL, "status" => status).increment(1);

        let reply = result?;
        if let Some(cache) = &self.cache {
            cache
                .insert(&self.model, message, language, reply.clone())
                .await;
        }
        Ok(reply)
    }

    async fn generate_uncached(&self, message: &str, language: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let prompt = build_prompt(message, language);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest {
                contents: vec![Content {
                    parts: vec![Part { text: prompt }],
                }],
            })
            .send()
            .await
            .map_err(|e| AgrogateError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgrogateError::Api {
                status: status.as_u16(),
                message: format!("generative API error: {status}"),
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AgrogateError::Http(e.to_string()))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(AgrogateError::EmptyResponse)
    }
}

/// Build the agricultural-assistant prompt.
fn build_prompt(message: &str, language: &str) -> String {
    let lowered = message.to_lowercase();
    let concise = CONCISE_TRIGGERS
        .iter()
        .any(|trigger| lowered.contains(trigger));
    format!(
        "You are an agricultural assistant. Reply in {language}.\nUser said: \"{message}\"\n{}",
        if concise {
            "Respond only in clear, short bullet points."
        } else {
            "Provide detailed and localized farming advice."
        }
    )
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}
