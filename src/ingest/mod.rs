// src/ingest/mod.rs
//! Ingestion & dedup engine.
//!
//! Each poll walks the enabled feed sources and runs every entry through
//! a fixed per-item sequence: validate → normalize → fingerprint →
//! upsert raw row → canonical-article gate → classify → language
//! override → insert. Failures are isolated: a bad source costs one
//! error count, a bad item never aborts the poll. Re-polling the same
//! link is idempotent — the raw row is updated in place and the
//! canonical article is created at most once per normalized url.

pub mod config;
pub mod rss;
pub mod scheduler;
pub mod types;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;

use crate::classify::ai::DynClassifier;
use crate::classify::{heuristic_category, ClassifyInput, Importance, Sentiment, StructuredFields};
use crate::fingerprint::{content_hash, short_hash};
use crate::normalize::{html_to_text, normalize_url, slugify};
use crate::store::ArticleStore;
use crate::symbols::{extract_symbols, finalize_symbols};
use types::{
    Article, ContentPolicy, FeedEntry, FeedTransport, LanguageMode, RawItem, Source, SourceKind,
    Status,
};

/// Upper bound on entries consumed from one source per poll.
pub const MAX_ENTRIES_PER_POLL: usize = 40;
/// Persisted body bound under the `excerpt_only` policy.
pub const EXCERPT_CHARS: usize = 900;
/// Slug base length before the hash suffix.
pub const SLUG_MAX_CHARS: usize = 60;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_entries_total", "Entries parsed from feeds.");
        describe_counter!("ingest_raw_upserts_total", "Raw items upserted.");
        describe_counter!("ingest_articles_created_total", "Canonical articles created.");
        describe_counter!(
            "ingest_skipped_total",
            "Entries skipped (missing title/link)."
        );
        describe_counter!("ingest_item_errors_total", "Per-item processing failures.");
        describe_counter!("ingest_source_errors_total", "Per-source fetch failures.");
        describe_counter!(
            "classify_fallback_total",
            "Items classified by heuristics instead of AI."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts when the ingest engine last ran."
        );
    });
}

/// Outcome of one poll across all sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Raw rows upserted (created or refreshed).
    pub raw_count: usize,
    /// Canonical articles created.
    pub article_count: usize,
    /// Source fetch failures plus isolated item failures.
    pub error_count: usize,
}

enum ItemOutcome {
    /// Raw row upserted and a canonical article created.
    Created,
    /// Raw row upserted; the canonical article already existed.
    Known,
    /// Entry failed validation (missing title/link); nothing written.
    Skipped,
}

pub struct IngestEngine {
    store: Arc<dyn ArticleStore>,
    transport: Arc<dyn FeedTransport>,
    classifier: DynClassifier,
}

impl IngestEngine {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        transport: Arc<dyn FeedTransport>,
        classifier: DynClassifier,
    ) -> Self {
        Self {
            store,
            transport,
            classifier,
        }
    }

    /// Poll every enabled feed source once. Never fails; all trouble is
    /// folded into `error_count`.
    pub async fn ingest_once(&self, sources: &[Source]) -> IngestReport {
        ensure_metrics_described();
        let mut report = IngestReport::default();

        for source in sources {
            if !source.enabled || source.kind == SourceKind::Api {
                continue;
            }
            if !is_http_url(&source.url) {
                continue;
            }

            let entries = match self.transport.fetch(source).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = ?e, source = %source.name, "source fetch failed");
                    counter!("ingest_source_errors_total").increment(1);
                    report.error_count += 1;
                    continue;
                }
            };

            for entry in entries.into_iter().take(MAX_ENTRIES_PER_POLL) {
                match self.process_entry(source, entry).await {
                    Ok(ItemOutcome::Created) => {
                        report.raw_count += 1;
                        report.article_count += 1;
                        counter!("ingest_articles_created_total").increment(1);
                    }
                    Ok(ItemOutcome::Known) => report.raw_count += 1,
                    Ok(ItemOutcome::Skipped) => {
                        counter!("ingest_skipped_total").increment(1);
                    }
                    Err(e) => {
                        tracing::warn!(error = ?e, source = %source.name, "item failed");
                        counter!("ingest_item_errors_total").increment(1);
                        report.error_count += 1;
                    }
                }
            }
        }

        gauge!("ingest_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
        report
    }

    async fn process_entry(&self, source: &Source, entry: FeedEntry) -> Result<ItemOutcome> {
        // 1) Required fields
        let title = entry.title.trim().to_string();
        let link = entry.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            return Ok(ItemOutcome::Skipped);
        }

        // 2) Identity + body text
        let normalized_url = normalize_url(&link);
        let body_text = entry
            .content
            .as_deref()
            .map(html_to_text)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                entry
                    .snippet
                    .as_deref()
                    .map(html_to_text)
                    .filter(|t| !t.is_empty())
            });

        // 3) Fingerprints
        let title_hash = content_hash(&title);
        let body_hash = body_text.as_deref().and_then(content_hash);

        // 4) Raw row upsert; the content policy bounds what raw text is
        //    ever persisted, not just what reaches the classifier.
        let metadata_only = source.content_policy == ContentPolicy::MetadataOnly;
        let raw = RawItem {
            source_name: source.name.clone(),
            link: link.clone(),
            normalized_url: normalized_url.clone(),
            title: title.clone(),
            author: entry.author.clone(),
            published_at: entry.published_at,
            raw_html: if metadata_only { None } else { entry.content.clone() },
            raw_text: if metadata_only { None } else { body_text.clone() },
            title_hash: title_hash.clone(),
            content_hash: body_hash,
        };
        self.store
            .upsert_raw_item(raw)
            .await
            .context("raw item upsert")?;
        counter!("ingest_raw_upserts_total").increment(1);

        // 5) Idempotency gate
        if self
            .store
            .article_exists(&normalized_url)
            .await
            .context("article existence check")?
        {
            return Ok(ItemOutcome::Known);
        }

        // 6) Slug
        let slug = build_slug(&source.name, &title, title_hash.as_deref());

        // 7) Content policy: what the classifier sees vs what persists
        let (classify_body, persisted_body) = match source.content_policy {
            ContentPolicy::Full => (body_text.clone(), body_text.clone()),
            ContentPolicy::ExcerptOnly => (
                body_text.clone(),
                body_text.as_deref().map(|t| truncate_chars(t, EXCERPT_CHARS)),
            ),
            ContentPolicy::MetadataOnly => (None, None),
        };

        // 8) Classify, falling back to heuristics on None
        let input = ClassifyInput {
            title: title.clone(),
            content: classify_body,
            source_name: source.name.clone(),
            url: normalized_url.clone(),
        };
        let ai = self.classifier.classify(&input).await;
        if ai.is_none() {
            counter!("classify_fallback_total").increment(1);
        }

        let heuristics_text = match &body_text {
            Some(b) => format!("{title} {b}"),
            None => title.clone(),
        };
        let (category, importance, sentiment) = match &ai {
            Some(f) => (f.category, f.importance, f.sentiment),
            None => (
                heuristic_category(&heuristics_text),
                Importance::default(),
                Sentiment::default(),
            ),
        };

        // 9) Symbols: AI wins when present, heuristics otherwise
        let symbols = match &ai {
            Some(f) if !f.symbols.is_empty() => finalize_symbols(&f.symbols),
            _ => extract_symbols(&heuristics_text),
        };

        let nonempty = |s: &String| !s.trim().is_empty();
        let (summary_en, summary_zh, key_points_en, key_points_zh, title_zh, lens_en, lens_zh) =
            match ai {
                Some(StructuredFields {
                    summary_en,
                    summary_zh,
                    key_points_en,
                    key_points_zh,
                    title_zh,
                    lens_en,
                    lens_zh,
                    ..
                }) => (
                    Some(summary_en).filter(nonempty),
                    Some(summary_zh).filter(nonempty),
                    key_points_en,
                    key_points_zh,
                    title_zh,
                    lens_en,
                    lens_zh,
                ),
                None => (None, None, Vec::new(), Vec::new(), None, None, None),
            };

        // 10) Editorial language override, then the fallback marker
        let mut article = Article {
            slug,
            url: normalized_url,
            source_name: source.name.clone(),
            title_en: title,
            title_zh,
            summary_en,
            summary_zh,
            content_en: persisted_body,
            content_zh: None,
            category,
            importance,
            sentiment,
            symbols,
            key_points_en,
            key_points_zh,
            lens_en,
            lens_zh,
            status: if source.auto_publish {
                Status::Published
            } else {
                Status::Pending
            },
            lang_fallback: false,
            published_at: entry.published_at.unwrap_or_else(Utc::now),
            heat: None,
        };
        apply_language_mode(&mut article, source.language_mode);
        article.lang_fallback = missing_required_language(&article, source.language_mode);

        // 11) Insert; metrics row is best-effort
        let slug = article.slug.clone();
        self.store
            .insert_article(article)
            .await
            .context("article insert")?;
        if let Err(e) = self.store.init_metrics(&slug).await {
            tracing::warn!(error = ?e, slug = %slug, "metrics init failed");
        }

        Ok(ItemOutcome::Created)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `safe-slugify(source + title)` capped, suffixed with the first 8 hex
/// chars of the title hash (or a timestamp when the hash is absent) so
/// similarly titled items cannot collide.
pub fn build_slug(source_name: &str, title: &str, title_hash: Option<&str>) -> String {
    let base = slugify(&format!("{source_name} {title}"), SLUG_MAX_CHARS);
    let base = if base.is_empty() { "item".to_string() } else { base };
    match title_hash {
        Some(h) => format!("{base}-{}", short_hash(h)),
        None => format!("{base}-{}", Utc::now().timestamp()),
    }
}

/// `en_only` forces Chinese fields empty regardless of classifier
/// output; `zh_only` mirrors it for English enrichment but keeps the
/// feed-given English title, which identity/slug derive from.
fn apply_language_mode(article: &mut Article, mode: LanguageMode) {
    match mode {
        LanguageMode::Bilingual => {}
        LanguageMode::EnOnly => {
            article.title_zh = None;
            article.summary_zh = None;
            article.content_zh = None;
            article.key_points_zh.clear();
            article.lens_zh = None;
        }
        LanguageMode::ZhOnly => {
            article.summary_en = None;
            article.key_points_en.clear();
            article.lens_en = None;
        }
    }
}

fn missing_required_language(article: &Article, mode: LanguageMode) -> bool {
    match mode {
        LanguageMode::Bilingual => {
            article.title_zh.is_none()
                || article.summary_zh.is_none()
                || article.summary_en.is_none()
        }
        LanguageMode::EnOnly => article.summary_en.is_none(),
        LanguageMode::ZhOnly => article.title_zh.is_none() || article.summary_zh.is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_carries_hash_suffix() {
        let h = content_hash("ECB holds rates").unwrap();
        let slug = build_slug("FX Wire", "ECB holds rates!", Some(&h));
        assert!(slug.starts_with("fx-wire-ecb-holds-rates-"));
        assert!(slug.ends_with(short_hash(&h)));
    }

    #[test]
    fn slug_of_cjk_title_still_has_a_base() {
        let slug = build_slug("快讯", "欧洲央行维持利率", Some(&"ab".repeat(32)));
        assert!(slug.starts_with("item-"));
    }

    #[test]
    fn truncate_is_char_aware() {
        assert_eq!(truncate_chars("欧洲央行维持", 3), "欧洲央");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn non_http_sources_are_detected() {
        assert!(is_http_url("https://example.com/feed"));
        assert!(!is_http_url("ftp://example.com/feed"));
        assert!(!is_http_url("file:///etc/feed"));
    }
}
