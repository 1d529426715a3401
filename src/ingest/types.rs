// src/ingest/types.rs
//! Data model for the ingestion pipeline: source configs, polled feed
//! entries, raw rows, canonical articles, and engagement counters.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{Category, Importance, Sentiment};

/// How much raw text may be persisted or sent to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentPolicy {
    #[default]
    Full,
    ExcerptOnly,
    MetadataOnly,
}

/// Editorial language override per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMode {
    #[default]
    Bilingual,
    EnOnly,
    ZhOnly,
}

/// Feed sources are polled; API sources are licensed ingestion handled
/// elsewhere and skipped by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Rss,
    Api,
}

/// A feed configuration. Created by an external admin workflow;
/// read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default)]
    pub content_policy: ContentPolicy,
    #[serde(default)]
    pub language_mode: LanguageMode,
    #[serde(default)]
    pub auto_publish: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// One entry as returned by the feed transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub content: Option<String>,
    pub snippet: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Feed transport contract. Errors surface as a single failure for that
/// source's poll; the engine counts them and moves on.
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &'static str;
}

/// One polled feed entry, upserted by `normalized_url` on every poll.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RawItem {
    pub source_name: String,
    pub link: String,
    pub normalized_url: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub raw_html: Option<String>,
    pub raw_text: Option<String>,
    pub title_hash: Option<String>,
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Published,
}

/// The canonical, publishable, bilingual record: exactly one per
/// distinct normalized link.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Article {
    pub slug: String,
    pub url: String,
    pub source_name: String,
    pub title_en: String,
    pub title_zh: Option<String>,
    pub summary_en: Option<String>,
    pub summary_zh: Option<String>,
    pub content_en: Option<String>,
    pub content_zh: Option<String>,
    pub category: Category,
    pub importance: Importance,
    pub sentiment: Sentiment,
    pub symbols: Vec<String>,
    pub key_points_en: Vec<String>,
    pub key_points_zh: Vec<String>,
    pub lens_en: Option<String>,
    pub lens_zh: Option<String>,
    pub status: Status,
    /// A required-language field is missing and must be synthesized at
    /// read time.
    pub lang_fallback: bool,
    pub published_at: DateTime<Utc>,
    /// Heat precomputed upstream, honored as-is by the scorer.
    pub heat: Option<f64>,
}

/// Per-article engagement counters. Mutated by external endpoints;
/// read-only here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EngagementMetrics {
    pub views: u64,
    pub clicks: u64,
    pub avg_dwell_seconds: f64,
}
