// src/translate/mod.rs
//! Read-time translation: decide whether stored bilingual text is
//! usable and, when it is not, synthesize a translation through a
//! two-tier fallback chain with an injected TTL cache.
//!
//! Chain per request: sufficiency check on stored text → cache lookup →
//! primary whole-pair translation → per-field secondary translation →
//! original text. Only successful, sanitized, non-passthrough results
//! are cached. Nothing here ever returns an error to the caller: the
//! worst case is original-language text.

pub mod cache;
pub mod providers;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::ingest::types::Article;
use cache::{CacheKey, CachedTranslation, TranslationCache, DEFAULT_TTL};
use providers::{PairTranslator, TextTranslator};

/// Display locales served by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Zh,
}

impl Lang {
    pub fn other(self) -> Self {
        match self {
            Lang::En => Lang::Zh,
            Lang::Zh => Lang::En,
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Zh => "Simplified Chinese",
        }
    }

    /// Language code for the machine-translation provider.
    pub fn mt_code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Zh => "zh-CN",
        }
    }
}

/// Display-ready text pair for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayText {
    pub title: String,
    pub summary: String,
}

/// Minimum share of target-script codepoints for stored text to count
/// as already translated.
pub const SUFFICIENCY_RATIO: f64 = 0.2;

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
    )
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c)
}

/// Script sufficiency over the combined title+summary: a CJK target
/// needs at least one CJK codepoint and a CJK share of at least
/// [`SUFFICIENCY_RATIO`]; the Latin target is symmetric.
pub fn is_sufficient(text: &str, target: Lang) -> bool {
    let mut cjk = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if is_cjk(c) {
            cjk += 1;
        } else if is_latin(c) {
            latin += 1;
        }
    }
    let total = cjk + latin;
    if total == 0 {
        return false;
    }
    match target {
        Lang::Zh => cjk >= 1 && (cjk as f64) / (total as f64) >= SUFFICIENCY_RATIO,
        Lang::En => latin >= 1 && (latin as f64) / (total as f64) >= SUFFICIENCY_RATIO,
    }
}

/// Known service responses that are error prose, not translations.
static PLACEHOLDER_MARKERS: &[&str] = &[
    "MYMEMORY WARNING",
    "NO QUERY SPECIFIED",
    "QUERY LENGTH LIMIT EXCEDEED",
    "QUERY LENGTH LIMIT EXCEEDED",
    "PLEASE SELECT TWO DISTINCT LANGUAGES",
    "INVALID LANGUAGE PAIR",
    "TRANSLATION NOT AVAILABLE",
];

pub fn is_placeholder(text: &str) -> bool {
    let up = text.to_uppercase();
    PLACEHOLDER_MARKERS.iter().any(|m| up.contains(m))
}

/// Strip the `|||` separator artifact some providers echo back, decode
/// HTML entities, and drop any remaining angle-bracket markup.
pub fn sanitize(text: &str) -> String {
    crate::normalize::html_to_text(&text.replace("|||", " "))
}

fn passthrough(out: &str, input: &str) -> bool {
    out.to_lowercase() == input.to_lowercase()
}

pub struct Translator {
    cache: Arc<TranslationCache>,
    primary: Option<Arc<dyn PairTranslator>>,
    secondary: Option<Arc<dyn TextTranslator>>,
    ttl: Duration,
}

impl Translator {
    pub fn new(
        cache: Arc<TranslationCache>,
        primary: Option<Arc<dyn PairTranslator>>,
        secondary: Option<Arc<dyn TextTranslator>>,
    ) -> Self {
        Self {
            cache,
            primary,
            secondary,
            ttl: DEFAULT_TTL,
        }
    }

    /// Shorter TTLs keep cache-expiry tests deterministic.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Display-ready `{title, summary}` for the requested locale.
    /// Synthesizes a translation only when the stored text is missing,
    /// a placeholder, or in the wrong script.
    pub async fn display_text(&self, article: &Article, locale: Lang) -> DisplayText {
        let (stored_title, stored_summary) = stored_pair(article, locale);
        let stored_title = stored_title.filter(|t| !is_placeholder(t));
        let stored_summary = stored_summary.filter(|t| !is_placeholder(t));

        // 1) Stored text already in the target script: no network call.
        if let Some(title) = &stored_title {
            let combined = match &stored_summary {
                Some(s) => format!("{title} {s}"),
                None => title.clone(),
            };
            if is_sufficient(&combined, locale) {
                return DisplayText {
                    title: title.clone(),
                    summary: stored_summary.unwrap_or_default(),
                };
            }
        }

        // 2) Translate from the other locale's stored text.
        let (src_title, src_summary) = stored_pair(article, locale.other());
        let Some(src_title) = src_title.filter(|t| !is_placeholder(t)) else {
            // Nothing usable on either side.
            return DisplayText {
                title: stored_title.unwrap_or_default(),
                summary: stored_summary.unwrap_or_default(),
            };
        };
        let src_summary = src_summary.filter(|t| !is_placeholder(t));

        // 3) Cache lookup on the normalized source pair.
        let key = CacheKey::new(&src_title, src_summary.as_deref().unwrap_or(""));
        if let Some(hit) = self.cache.get(&key) {
            return DisplayText {
                title: hit.title,
                summary: hit.summary,
            };
        }

        counter!("translation_attempts_total").increment(1);
        let from = locale.other();

        // 4) Primary path: whole pair, contextually consistent.
        if let Some(primary) = &self.primary {
            if let Some(pair) = primary
                .translate_pair(
                    &src_title,
                    src_summary.as_deref().unwrap_or(""),
                    from,
                    locale,
                )
                .await
            {
                let title = sanitize(&pair.title);
                // With no source summary there is nothing to translate;
                // anything the provider put in that slot is noise.
                let summary = match &src_summary {
                    Some(_) => sanitize(&pair.summary),
                    None => String::new(),
                };
                let title_ok =
                    !title.is_empty() && !is_placeholder(&title) && !passthrough(&title, &src_title);
                let summary_ok = match &src_summary {
                    Some(src) => {
                        !summary.is_empty()
                            && !is_placeholder(&summary)
                            && !passthrough(&summary, src)
                    }
                    None => true,
                };
                if title_ok && summary_ok {
                    self.cache.put(
                        key,
                        CachedTranslation {
                            title: title.clone(),
                            summary: summary.clone(),
                        },
                        self.ttl,
                    );
                    return DisplayText { title, summary };
                }
            }
        }

        // 5) Secondary path: per field, independent failures.
        if let Some(secondary) = &self.secondary {
            let t = translate_field(secondary.as_ref(), &src_title, from, locale).await;
            let s = match &src_summary {
                Some(src) => translate_field(secondary.as_ref(), src, from, locale).await,
                None => None,
            };
            if t.is_some() || s.is_some() {
                let full_success = t.is_some() && (src_summary.is_none() || s.is_some());
                let title = t.unwrap_or_else(|| src_title.clone());
                let summary = s.or_else(|| src_summary.clone()).unwrap_or_default();
                // Cache only a complete success; a half-translated pair
                // would pin a passthrough for the TTL window.
                if full_success {
                    self.cache.put(
                        key,
                        CachedTranslation {
                            title: title.clone(),
                            summary: summary.clone(),
                        },
                        self.ttl,
                    );
                }
                return DisplayText { title, summary };
            }
        }

        counter!("translation_failures_total").increment(1);

        // 6) Both paths failed: fall back to the original text.
        DisplayText {
            title: src_title,
            summary: src_summary.unwrap_or_default(),
        }
    }
}

/// Stored `{title, summary}` for one locale, blank fields as `None`.
fn stored_pair(article: &Article, locale: Lang) -> (Option<String>, Option<String>) {
    let nonblank = |s: &str| {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
    };
    match locale {
        Lang::En => (
            nonblank(&article.title_en),
            article.summary_en.as_deref().and_then(nonblank),
        ),
        Lang::Zh => (
            article.title_zh.as_deref().and_then(nonblank),
            article.summary_zh.as_deref().and_then(nonblank),
        ),
    }
}

/// One secondary-path field: reject warnings, empty-after-sanitize
/// output, and case-insensitive passthroughs.
async fn translate_field(
    secondary: &dyn TextTranslator,
    text: &str,
    from: Lang,
    to: Lang,
) -> Option<String> {
    let raw = secondary.translate_text(text, from, to).await?;
    if is_placeholder(&raw) {
        return None;
    }
    let clean = sanitize(&raw);
    if clean.is_empty() || passthrough(&clean, text) {
        return None;
    }
    Some(clean)
}
