// src/store.rs
//! Storage seam for the pipeline. The production deployment sits on a
//! relational store; everything the engine needs from it is
//! upsert-by-unique-key, an existence check, and simple filtered reads,
//! so the trait stays that narrow. `MemoryStore` backs tests and local
//! runs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::ingest::types::{Article, EngagementMetrics, RawItem, Status};

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert-or-update keyed by `normalized_url`; a second poll of the
    /// same link updates the row rather than duplicating it.
    async fn upsert_raw_item(&self, item: RawItem) -> Result<()>;

    /// Uniqueness on `url` is the concurrency guard against duplicate
    /// canonical articles.
    async fn article_exists(&self, url: &str) -> Result<bool>;

    /// Fails on a duplicate `url` or `slug`.
    async fn insert_article(&self, article: Article) -> Result<()>;

    /// Zeroed engagement counters for a fresh article. Best-effort at
    /// the call site: a failure never rolls back the article.
    async fn init_metrics(&self, slug: &str) -> Result<()>;

    async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    async fn metrics_by_slug(&self, slug: &str) -> Result<Option<EngagementMetrics>>;

    async fn list_published(&self) -> Result<Vec<(Article, EngagementMetrics)>>;
}

#[derive(Default)]
struct Inner {
    raw: HashMap<String, RawItem>,
    articles: HashMap<String, Article>,
    article_urls: HashSet<String>,
    metrics: HashMap<String, EngagementMetrics>,
}

/// Process-local store with the same key semantics as the relational one.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: current raw rows, unordered.
    pub fn raw_items(&self) -> Vec<RawItem> {
        self.inner.lock().expect("store lock").raw.values().cloned().collect()
    }

    /// Test helper: current articles, unordered.
    pub fn articles(&self) -> Vec<Article> {
        self.inner
            .lock()
            .expect("store lock")
            .articles
            .values()
            .cloned()
            .collect()
    }

    /// Test helper: overwrite engagement counters for one article.
    pub fn set_metrics(&self, slug: &str, m: EngagementMetrics) {
        self.inner
            .lock()
            .expect("store lock")
            .metrics
            .insert(slug.to_string(), m);
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn upsert_raw_item(&self, item: RawItem) -> Result<()> {
        let mut g = self.inner.lock().expect("store lock");
        g.raw.insert(item.normalized_url.clone(), item);
        Ok(())
    }

    async fn article_exists(&self, url: &str) -> Result<bool> {
        let g = self.inner.lock().expect("store lock");
        Ok(g.article_urls.contains(url))
    }

    async fn insert_article(&self, article: Article) -> Result<()> {
        let mut g = self.inner.lock().expect("store lock");
        if g.article_urls.contains(&article.url) {
            bail!("article url already exists: {}", article.url);
        }
        if g.articles.contains_key(&article.slug) {
            bail!("article slug already exists: {}", article.slug);
        }
        g.article_urls.insert(article.url.clone());
        g.articles.insert(article.slug.clone(), article);
        Ok(())
    }

    async fn init_metrics(&self, slug: &str) -> Result<()> {
        let mut g = self.inner.lock().expect("store lock");
        g.metrics
            .entry(slug.to_string())
            .or_insert_with(EngagementMetrics::default);
        Ok(())
    }

    async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let g = self.inner.lock().expect("store lock");
        Ok(g.articles.get(slug).cloned())
    }

    async fn metrics_by_slug(&self, slug: &str) -> Result<Option<EngagementMetrics>> {
        let g = self.inner.lock().expect("store lock");
        Ok(g.metrics.get(slug).copied())
    }

    async fn list_published(&self) -> Result<Vec<(Article, EngagementMetrics)>> {
        let g = self.inner.lock().expect("store lock");
        Ok(g.articles
            .values()
            .filter(|a| a.status == Status::Published)
            .map(|a| {
                let m = g.metrics.get(&a.slug).copied().unwrap_or_default();
                (a.clone(), m)
            })
            .collect())
    }
}
