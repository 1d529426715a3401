// src/classify/ai.rs
//! AI-assisted classification client. One bounded request per item; any
//! transport, parse, or schema failure collapses to `None` so the caller
//! can branch to heuristics without error plumbing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ClassifyInput, RawClassification, StructuredFields};

/// Request timeout for the classification call.
pub const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(12);

#[async_trait]
pub trait ClassifierClient: Send + Sync {
    /// `None` means "use heuristics for this item" — never an error.
    async fn classify(&self, input: &ClassifyInput) -> Option<StructuredFields>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn ClassifierClient>;

/// Returns `None` always; used when no credential is configured.
pub struct DisabledClassifier;

#[async_trait]
impl ClassifierClient for DisabledClassifier {
    async fn classify(&self, _input: &ClassifyInput) -> Option<StructuredFields> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-answer client for tests.
#[derive(Clone)]
pub struct MockClassifier {
    pub fixed: Option<StructuredFields>,
}

#[async_trait]
impl ClassifierClient for MockClassifier {
    async fn classify(&self, _input: &ClassifyInput) -> Option<StructuredFields> {
        self.fixed.clone()
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// OpenAI-backed classifier (Chat Completions). Requires `OPENAI_API_KEY`;
/// with no key present it short-circuits to `None` without a network call.
pub struct OpenAiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClassifier {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("marketwire/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(CLASSIFY_TIMEOUT)
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }
}

const CLASSIFY_SYSTEM_PROMPT: &str = "You classify market news. Reply with ONE JSON object and \
nothing else, keys: category (macro|crypto|commodities|stocks|fx), importance (high|medium|low), \
sentiment (bullish|bearish|neutral), symbols (array of instrument codes, max 12), \
summary_en (<=600 chars), summary_zh (<=600 chars, Simplified Chinese), \
key_points_en (3-5 strings or empty array), key_points_zh (3-5 strings or empty array), \
title_zh (Chinese title or null), lens_en (short commentary or null), lens_zh (or null).";

#[async_trait]
impl ClassifierClient for OpenAiClassifier {
    async fn classify(&self, input: &ClassifyInput) -> Option<StructuredFields> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let user = format!(
            "source: {}\nurl: {}\ntitle: {}\ncontent: {}",
            input.source_name,
            input.url,
            input.title,
            input.content.as_deref().unwrap_or("(none)")
        );
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: CLASSIFY_SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let content = body.choices.first().map(|c| c.message.content.as_str())?;

        let raw: RawClassification = serde_json::from_str(strip_code_fences(content)).ok()?;
        StructuredFields::validated(raw)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Models often wrap JSON replies in Markdown fences despite the prompt.
fn strip_code_fences(s: &str) -> &str {
    let t = s.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

/// Build a classifier from the environment: OpenAI when a key is set,
/// otherwise the disabled client (an expected operating mode, not an error).
pub fn classifier_from_env() -> DynClassifier {
    let has_key = std::env::var("OPENAI_API_KEY")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    if has_key {
        let model = std::env::var("OPENAI_MODEL").ok();
        Arc::new(OpenAiClassifier::new(model.as_deref()))
    } else {
        Arc::new(DisabledClassifier)
    }
}
