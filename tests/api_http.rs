// tests/api_http.rs
//! End-to-end checks of the HTTP surface against an in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt;

use marketwire::api::{create_router, AppState};
use marketwire::classify::ai::DisabledClassifier;
use marketwire::classify::{Category, Importance, Sentiment};
use marketwire::heat::HeatConfig;
use marketwire::ingest::rss::FixtureTransport;
use marketwire::ingest::types::{Article, EngagementMetrics, Source, Status};
use marketwire::ingest::IngestEngine;
use marketwire::store::{ArticleStore, MemoryStore};
use marketwire::translate::cache::TranslationCache;
use marketwire::translate::Translator;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
  <title>FX Wire</title>
  <item>
    <title>ECB holds rates as EUR/USD rallies</title>
    <link>https://example.com/ecb-holds</link>
    <description>The central bank left policy unchanged.</description>
    <pubDate>Thu, 27 Aug 2026 09:00:00 +0000</pubDate>
  </item>
  <item>
    <title>Gold climbs on safe-haven demand</title>
    <link>https://example.com/gold-climbs</link>
    <description>Bullion extended gains for a third session.</description>
    <pubDate>Thu, 27 Aug 2026 10:00:00 +0000</pubDate>
  </item>
</channel>
</rss>"#;

fn app(store: Arc<MemoryStore>, sources: Vec<Source>) -> Router {
    let transport = Arc::new(FixtureTransport::from_xml(FEED));
    let engine = Arc::new(IngestEngine::new(
        store.clone(),
        transport,
        Arc::new(DisabledClassifier),
    ));
    let translator = Arc::new(Translator::new(
        Arc::new(TranslationCache::new()),
        None,
        None,
    ));
    create_router(AppState {
        store,
        engine,
        translator,
        sources: Arc::new(sources),
        heat: HeatConfig::default(),
    })
}

fn article(slug: &str, title_en: &str, hours_old: i64) -> Article {
    Article {
        slug: slug.into(),
        url: format!("https://example.com/{slug}"),
        source_name: "FX Wire".into(),
        title_en: title_en.into(),
        title_zh: Some("欧洲央行维持利率不变".into()),
        summary_en: Some("Policy left unchanged.".into()),
        summary_zh: Some("政策维持不变。".into()),
        content_en: Some("Full text.".into()),
        content_zh: None,
        category: Category::Macro,
        importance: Importance::High,
        sentiment: Sentiment::Bullish,
        symbols: vec!["EURUSD".into()],
        key_points_en: vec!["Rates on hold".into()],
        key_points_zh: vec![],
        lens_en: Some("Watch the next CPI print.".into()),
        lens_zh: None,
        status: Status::Published,
        lang_fallback: false,
        published_at: Utc::now() - Duration::hours(hours_old),
        heat: None,
    }
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn health_returns_ok() {
    let router = app(Arc::new(MemoryStore::new()), vec![]);
    let resp = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn ingest_run_reports_created_articles() {
    let store = Arc::new(MemoryStore::new());
    let sources = vec![Source {
        name: "FX Wire".into(),
        url: "https://example.com/feed.xml".into(),
        kind: Default::default(),
        content_policy: Default::default(),
        language_mode: Default::default(),
        auto_publish: true,
        enabled: true,
    }];
    let router = app(store.clone(), sources);

    let resp = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let report: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report["raw_count"], 2);
    assert_eq!(report["article_count"], 2);
    assert_eq!(report["error_count"], 0);
    assert_eq!(store.articles().len(), 2);
}

#[tokio::test]
async fn hot_list_orders_by_engagement_and_recency() {
    let store = Arc::new(MemoryStore::new());
    // Same age, very different engagement.
    store.insert_article(article("quiet-story", "Quiet story", 2)).await.unwrap();
    store.insert_article(article("busy-story", "Busy story", 2)).await.unwrap();
    store.set_metrics(
        "busy-story",
        EngagementMetrics {
            views: 5_000,
            clicks: 800,
            avg_dwell_seconds: 40.0,
        },
    );

    let router = app(store, vec![]);
    let (status, body) = get_json(router, "/news/hot").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["slug"], "busy-story");
    assert_eq!(items[1]["slug"], "quiet-story");
    assert!(items[0]["heat"].as_f64().unwrap() > items[1]["heat"].as_f64().unwrap());
    assert_eq!(items[0]["title_en"], "Busy story");
    assert_eq!(items[0]["symbols"][0], "EURUSD");
}

#[tokio::test]
async fn hot_list_respects_limit() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..5 {
        store
            .insert_article(article(&format!("story-{i}"), "Story", i))
            .await
            .unwrap();
    }
    let router = app(store, vec![]);
    let (status, body) = get_json(router, "/news/hot?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn hot_list_excludes_pending_articles() {
    let store = Arc::new(MemoryStore::new());
    let mut pending = article("pending-story", "Pending story", 1);
    pending.status = Status::Pending;
    store.insert_article(pending).await.unwrap();
    store.insert_article(article("live-story", "Live story", 1)).await.unwrap();

    let router = app(store, vec![]);
    let (_, body) = get_json(router, "/news/hot").await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["slug"], "live-story");
}

#[tokio::test]
async fn detail_serves_each_stored_locale() {
    let store = Arc::new(MemoryStore::new());
    store.insert_article(article("ecb-holds", "ECB holds rates", 1)).await.unwrap();
    store.set_metrics(
        "ecb-holds",
        EngagementMetrics {
            views: 42,
            clicks: 7,
            avg_dwell_seconds: 12.5,
        },
    );
    let router = app(store, vec![]);

    let (status, en) = get_json(router.clone(), "/news/ecb-holds?lang=en").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(en["lang"], "en");
    assert_eq!(en["title"], "ECB holds rates");
    assert_eq!(en["summary"], "Policy left unchanged.");
    assert_eq!(en["content"], "Full text.");
    assert_eq!(en["key_points"][0], "Rates on hold");
    assert_eq!(en["lens"], "Watch the next CPI print.");
    assert_eq!(en["importance"], "high");
    assert_eq!(en["status"], "published");
    assert_eq!(en["engagement"]["views"], 42);
    assert_eq!(en["engagement"]["clicks"], 7);

    let (status, zh) = get_json(router, "/news/ecb-holds?lang=zh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(zh["lang"], "zh");
    assert_eq!(zh["title"], "欧洲央行维持利率不变");
    assert_eq!(zh["summary"], "政策维持不变。");
    // Per-locale enrichment is never machine-filled.
    assert_eq!(zh["content"], serde_json::Value::Null);
    assert_eq!(zh["key_points"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn detail_defaults_to_english() {
    let store = Arc::new(MemoryStore::new());
    store.insert_article(article("ecb-holds", "ECB holds rates", 1)).await.unwrap();
    let router = app(store, vec![]);
    let (status, body) = get_json(router, "/news/ecb-holds").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lang"], "en");
    assert_eq!(body["title"], "ECB holds rates");
}

#[tokio::test]
async fn unknown_slug_is_404() {
    let router = app(Arc::new(MemoryStore::new()), vec![]);
    let (status, _) = get_json(router, "/news/no-such-story").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
