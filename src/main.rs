//! Bilingual market-news pipeline — binary entrypoint.
//! Wires the store, classifier, translators, poll scheduler, and the
//! Axum HTTP surface.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marketwire::api::{create_router, AppState};
use marketwire::classify::ai::classifier_from_env;
use marketwire::heat::HeatConfig;
use marketwire::ingest::config::load_sources_default;
use marketwire::ingest::rss::RssTransport;
use marketwire::ingest::scheduler::{spawn_poll_scheduler, IngestSchedulerCfg};
use marketwire::ingest::IngestEngine;
use marketwire::metrics::Metrics;
use marketwire::store::{ArticleStore, MemoryStore};
use marketwire::translate::cache::{TranslationCache, DEFAULT_TTL};
use marketwire::translate::providers::{
    MyMemoryTranslator, OpenAiPairTranslator, PairTranslator, TextTranslator,
};
use marketwire::translate::Translator;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marketwire=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = Metrics::init(DEFAULT_TTL.as_secs());

    let sources = load_sources_default().context("loading source config")?;
    tracing::info!(count = sources.len(), "sources loaded");

    let store: Arc<dyn ArticleStore> = Arc::new(MemoryStore::new());
    let transport = Arc::new(RssTransport::new());
    let engine = Arc::new(IngestEngine::new(
        store.clone(),
        transport,
        classifier_from_env(),
    ));

    // Primary translation rides the same credential as classification;
    // the machine-translation fallback needs none.
    let has_openai = std::env::var("OPENAI_API_KEY")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    let model = std::env::var("OPENAI_MODEL").ok();
    let primary: Option<Arc<dyn PairTranslator>> = if has_openai {
        Some(Arc::new(OpenAiPairTranslator::new(model.as_deref())))
    } else {
        None
    };
    let secondary: Option<Arc<dyn TextTranslator>> = Some(Arc::new(MyMemoryTranslator::new()));
    let translator = Arc::new(Translator::new(
        Arc::new(TranslationCache::new()),
        primary,
        secondary,
    ));

    let scheduler_cfg = IngestSchedulerCfg {
        interval_secs: env_u64("MARKETWIRE_POLL_SECS", 300),
    };
    spawn_poll_scheduler(engine.clone(), sources.clone(), scheduler_cfg);

    let state = AppState {
        store,
        engine,
        translator,
        sources: Arc::new(sources),
        heat: HeatConfig::default(),
    };
    let app = create_router(state).merge(metrics.router());

    let port = env_u64("PORT", 8080);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
