// src/api.rs
//! Thin HTTP surface over the pipeline's three operations: run one
//! ingest poll, list hot articles, and serve one article's display text
//! in a requested locale.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::cors::CorsLayer;

use crate::classify::{Category, Importance, Sentiment};
use crate::heat::{hot_order, HeatConfig};
use crate::ingest::types::{EngagementMetrics, Source, Status};
use crate::ingest::{IngestEngine, IngestReport};
use crate::store::ArticleStore;
use crate::translate::{Lang, Translator};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
    pub engine: Arc<IngestEngine>,
    pub translator: Arc<Translator>,
    pub sources: Arc<Vec<Source>>,
    pub heat: HeatConfig,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ingest/run", post(run_ingest))
        .route("/news/hot", get(hot_list))
        .route("/news/{slug}", get(article_detail))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn run_ingest(State(state): State<AppState>) -> Json<IngestReport> {
    let report = state.engine.ingest_once(&state.sources).await;
    Json(report)
}

#[derive(serde::Deserialize)]
struct HotQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(serde::Serialize)]
struct HotItem {
    slug: String,
    title_en: String,
    title_zh: Option<String>,
    category: Category,
    sentiment: Sentiment,
    symbols: Vec<String>,
    heat: f64,
}

async fn hot_list(
    State(state): State<AppState>,
    Query(q): Query<HotQuery>,
) -> Result<Json<Vec<HotItem>>, StatusCode> {
    let items = state
        .store
        .list_published()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let ordered = hot_order(items, Utc::now(), &state.heat);
    let out = ordered
        .into_iter()
        .take(q.limit.min(100))
        .map(|(a, heat)| HotItem {
            slug: a.slug,
            title_en: a.title_en,
            title_zh: a.title_zh,
            category: a.category,
            sentiment: a.sentiment,
            symbols: a.symbols,
            heat,
        })
        .collect();
    Ok(Json(out))
}

#[derive(serde::Deserialize)]
struct DetailQuery {
    #[serde(default)]
    lang: Lang,
}

#[derive(serde::Serialize)]
struct DetailResp {
    slug: String,
    url: String,
    lang: Lang,
    title: String,
    summary: String,
    content: Option<String>,
    category: Category,
    importance: Importance,
    sentiment: Sentiment,
    symbols: Vec<String>,
    key_points: Vec<String>,
    lens: Option<String>,
    status: Status,
    engagement: EngagementMetrics,
}

async fn article_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(q): Query<DetailQuery>,
) -> Result<Json<DetailResp>, StatusCode> {
    let article = state
        .store
        .article_by_slug(&slug)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let engagement = state
        .store
        .metrics_by_slug(&slug)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .unwrap_or_default();

    let display = state.translator.display_text(&article, q.lang).await;
    let (content, key_points, lens) = match q.lang {
        Lang::En => (
            article.content_en.clone(),
            article.key_points_en.clone(),
            article.lens_en.clone(),
        ),
        Lang::Zh => (
            article.content_zh.clone(),
            article.key_points_zh.clone(),
            article.lens_zh.clone(),
        ),
    };

    Ok(Json(DetailResp {
        slug: article.slug,
        url: article.url,
        lang: q.lang,
        title: display.title,
        summary: display.summary,
        content,
        category: article.category,
        importance: article.importance,
        sentiment: article.sentiment,
        symbols: article.symbols,
        key_points,
        lens,
        status: article.status,
        engagement,
    }))
}
