// tests/ingest_idempotent.rs
//! Repeated polling of the same links must never duplicate raw rows or
//! canonical articles.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use marketwire::classify::ai::DisabledClassifier;
use marketwire::ingest::types::{
    ContentPolicy, FeedEntry, FeedTransport, LanguageMode, Source, SourceKind, Status,
};
use marketwire::ingest::IngestEngine;
use marketwire::store::MemoryStore;

/// Returns one scripted batch per poll, then empty batches.
struct ScriptedTransport {
    polls: Mutex<VecDeque<Vec<FeedEntry>>>,
}

impl ScriptedTransport {
    fn new(polls: Vec<Vec<FeedEntry>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
        }
    }
}

#[async_trait::async_trait]
impl FeedTransport for ScriptedTransport {
    async fn fetch(&self, _source: &Source) -> Result<Vec<FeedEntry>> {
        Ok(self.polls.lock().unwrap().pop_front().unwrap_or_default())
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct FailingTransport;

#[async_trait::async_trait]
impl FeedTransport for FailingTransport {
    async fn fetch(&self, _source: &Source) -> Result<Vec<FeedEntry>> {
        anyhow::bail!("connection refused")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

fn source(auto_publish: bool) -> Source {
    Source {
        name: "FX Wire".into(),
        url: "https://example.com/feed".into(),
        kind: SourceKind::Rss,
        content_policy: ContentPolicy::Full,
        language_mode: LanguageMode::Bilingual,
        auto_publish,
        enabled: true,
    }
}

fn entry(title: &str, link: &str) -> FeedEntry {
    FeedEntry {
        title: title.into(),
        link: link.into(),
        content: Some(format!("<p>{title} full body</p>")),
        snippet: None,
        author: None,
        published_at: Some(Utc::now()),
    }
}

fn engine(store: Arc<MemoryStore>, transport: Arc<dyn FeedTransport>) -> IngestEngine {
    IngestEngine::new(store, transport, Arc::new(DisabledClassifier))
}

#[tokio::test]
async fn same_link_across_polls_yields_one_raw_and_one_article() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(vec![
        vec![entry("ECB holds rates", "https://example.com/ecb?a=1&b=2")],
        vec![entry("ECB holds rates", "https://example.com/ecb?a=1&b=2")],
    ]));
    let engine = engine(store.clone(), transport);
    let sources = vec![source(true)];

    let first = engine.ingest_once(&sources).await;
    assert_eq!(first.raw_count, 1);
    assert_eq!(first.article_count, 1);
    assert_eq!(first.error_count, 0);

    let second = engine.ingest_once(&sources).await;
    assert_eq!(second.raw_count, 1); // refreshed, not duplicated
    assert_eq!(second.article_count, 0);

    assert_eq!(store.raw_items().len(), 1);
    assert_eq!(store.articles().len(), 1);
}

#[tokio::test]
async fn changed_title_updates_raw_in_place_but_keeps_the_article() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(vec![
        vec![entry("ECB holds rates", "https://example.com/ecb")],
        vec![entry("ECB holds rates (updated)", "https://example.com/ecb")],
    ]));
    let engine = engine(store.clone(), transport);
    let sources = vec![source(true)];

    engine.ingest_once(&sources).await;
    engine.ingest_once(&sources).await;

    let raw = store.raw_items();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].title, "ECB holds rates (updated)");

    let articles = store.articles();
    assert_eq!(articles.len(), 1);
    // The article predates the second poll and is left unchanged.
    assert_eq!(articles[0].title_en, "ECB holds rates");
}

#[tokio::test]
async fn tracking_variants_of_one_link_are_one_article() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(vec![vec![
        entry(
            "Gold climbs",
            "https://example.com/gold?b=2&a=1&utm_source=rss#frag",
        ),
        entry("Gold climbs", "https://example.com/gold?a=1&b=2"),
    ]]));
    let engine = engine(store.clone(), transport);

    let report = engine.ingest_once(&[source(true)]).await;
    assert_eq!(report.raw_count, 2); // both entries upserted the same row
    assert_eq!(report.article_count, 1);
    assert_eq!(store.raw_items().len(), 1);
    assert_eq!(store.articles().len(), 1);
}

#[tokio::test]
async fn entries_without_title_or_link_are_skipped_not_errors() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(vec![vec![
        entry("", "https://example.com/a"),
        entry("No link", ""),
        entry("Kept", "https://example.com/kept"),
    ]]));
    let engine = engine(store.clone(), transport);

    let report = engine.ingest_once(&[source(false)]).await;
    assert_eq!(report.raw_count, 1);
    assert_eq!(report.article_count, 1);
    assert_eq!(report.error_count, 0);
    assert_eq!(store.articles()[0].status, Status::Pending);
}

#[tokio::test]
async fn source_fetch_failure_is_counted_and_isolated() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(store.clone(), Arc::new(FailingTransport));

    let report = engine.ingest_once(&[source(true)]).await;
    assert_eq!(report.error_count, 1);
    assert_eq!(report.raw_count, 0);
    assert!(store.articles().is_empty());
}

#[tokio::test]
async fn disabled_api_and_non_http_sources_are_not_polled() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(ScriptedTransport::new(vec![vec![entry(
        "Should not appear",
        "https://example.com/x",
    )]]));
    let engine = engine(store.clone(), transport);

    let mut disabled = source(true);
    disabled.enabled = false;
    let mut api_only = source(true);
    api_only.kind = SourceKind::Api;
    let mut bad_scheme = source(true);
    bad_scheme.url = "ftp://example.com/feed".into();

    let report = engine
        .ingest_once(&[disabled, api_only, bad_scheme])
        .await;
    assert_eq!(report, Default::default());
    assert!(store.raw_items().is_empty());
}
