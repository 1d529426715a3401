// src/translate/providers.rs
//! Translation providers behind two seams: a whole-pair primary (one
//! contextual call for title+summary) and a per-field secondary used
//! when the primary is unconfigured or fails. Providers return raw
//! `Option`s; the chain in `translate::mod` sanitizes and validates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Lang;

/// Primary path timeout (whole pair).
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(12);
/// Secondary path timeout (per field).
pub const SECONDARY_TIMEOUT: Duration = Duration::from_secs(4);

/// Exactly the two expected fields; anything else fails the parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslatedPair {
    pub title: String,
    pub summary: String,
}

#[async_trait]
pub trait PairTranslator: Send + Sync {
    async fn translate_pair(
        &self,
        title: &str,
        summary: &str,
        from: Lang,
        to: Lang,
    ) -> Option<TranslatedPair>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait TextTranslator: Send + Sync {
    async fn translate_text(&self, text: &str, from: Lang, to: Lang) -> Option<String>;
    fn name(&self) -> &'static str;
}

/// LLM-backed pair translation. No key → `None` with no network call.
pub struct OpenAiPairTranslator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiPairTranslator {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("marketwire/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(PRIMARY_TIMEOUT)
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

#[async_trait]
impl PairTranslator for OpenAiPairTranslator {
    async fn translate_pair(
        &self,
        title: &str,
        summary: &str,
        from: Lang,
        to: Lang,
    ) -> Option<TranslatedPair> {
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

        let sys = format!(
            "Translate from {} to {}. Preserve proper nouns, numbers, and currency codes \
             exactly. Reply with ONE JSON object containing only the keys \"title\" and \
             \"summary\" and nothing else.",
            from.english_name(),
            to.english_name()
        );
        let user = serde_json::json!({ "title": title, "summary": summary }).to_string();
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &sys,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.1,
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
        let content = body.choices.first().map(|c| c.message.content.trim())?;
        let content = content
            .strip_prefix("```json")
            .or_else(|| content.strip_prefix("```"))
            .unwrap_or(content);
        let content = content.strip_suffix("```").unwrap_or(content);
        serde_json::from_str(content.trim()).ok()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// MyMemory-style machine translation, per field, no shared context.
/// Warning markers and passthroughs in the response are the chain's
/// problem; this just does the call.
pub struct MyMemoryTranslator {
    http: reqwest::Client,
    endpoint: String,
}

impl MyMemoryTranslator {
    pub fn new() -> Self {
        Self::with_endpoint("https://api.mymemory.translated.net/get")
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("marketwire/0.1")
            .connect_timeout(Duration::from_secs(2))
            .timeout(SECONDARY_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }
}

impl Default for MyMemoryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextTranslator for MyMemoryTranslator {
    async fn translate_text(&self, text: &str, from: Lang, to: Lang) -> Option<String> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(rename = "responseData")]
            response_data: RespData,
        }
        #[derive(Deserialize)]
        struct RespData {
            #[serde(rename = "translatedText")]
            translated_text: String,
        }

        let langpair = format!("{}|{}", from.mt_code(), to.mt_code());
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("q", text), ("langpair", &langpair)])
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        Some(body.response_data.translated_text)
    }

    fn name(&self) -> &'static str {
        "mymemory"
    }
}

// ------------------------------------------------------------
// Test doubles (shared by unit and integration tests)
// ------------------------------------------------------------

/// Fixed-answer pair translator that counts invocations.
pub struct MockPairTranslator {
    pub fixed: Option<TranslatedPair>,
    calls: Arc<AtomicUsize>,
}

impl MockPairTranslator {
    pub fn new(fixed: Option<TranslatedPair>) -> Self {
        Self {
            fixed,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PairTranslator for MockPairTranslator {
    async fn translate_pair(
        &self,
        _title: &str,
        _summary: &str,
        _from: Lang,
        _to: Lang,
    ) -> Option<TranslatedPair> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fixed.clone()
    }

    fn name(&self) -> &'static str {
        "mock-pair"
    }
}

/// Fixed-answer per-field translator that counts invocations.
pub struct MockTextTranslator {
    pub fixed: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockTextTranslator {
    pub fn new(fixed: Option<&str>) -> Self {
        Self {
            fixed: fixed.map(|s| s.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextTranslator for MockTextTranslator {
    async fn translate_text(&self, _text: &str, _from: Lang, _to: Lang) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fixed.clone()
    }

    fn name(&self) -> &'static str {
        "mock-text"
    }
}
