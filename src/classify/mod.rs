// src/classify/mod.rs
//! Classification contract and heuristic fallback.
//!
//! The AI path returns `Option<StructuredFields>`: `None` means "use
//! heuristics for this item" and is never an error. `StructuredFields`
//! enforces its bounds (enum values, summary length, key-point counts,
//! symbol cap) at construction, so downstream code never re-validates.

pub mod ai;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::symbols;

/// Max chars for either summary field.
pub const MAX_SUMMARY_CHARS: usize = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Macro,
    Crypto,
    Commodities,
    Stocks,
    #[default]
    Fx,
}

impl Category {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "macro" => Some(Self::Macro),
            "crypto" => Some(Self::Crypto),
            "commodities" => Some(Self::Commodities),
            "stocks" => Some(Self::Stocks),
            "fx" => Some(Self::Fx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Medium,
    Low,
}

impl Importance {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Sentiment {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Some(Self::Bullish),
            "bearish" => Some(Self::Bearish),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// Input handed to the classifier. `content` is already bounded by the
/// source's content policy before it gets here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyInput {
    pub title: String,
    pub content: Option<String>,
    pub source_name: String,
    pub url: String,
}

/// Wire shape as returned by the model, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawClassification {
    pub category: String,
    pub importance: String,
    pub sentiment: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub summary_en: String,
    #[serde(default)]
    pub summary_zh: String,
    #[serde(default)]
    pub key_points_en: Vec<String>,
    #[serde(default)]
    pub key_points_zh: Vec<String>,
    #[serde(default)]
    pub title_zh: Option<String>,
    #[serde(default)]
    pub lens_en: Option<String>,
    #[serde(default)]
    pub lens_zh: Option<String>,
}

/// Validated classification result. Construct via [`StructuredFields::validated`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredFields {
    pub category: Category,
    pub importance: Importance,
    pub sentiment: Sentiment,
    pub symbols: Vec<String>,
    pub summary_en: String,
    pub summary_zh: String,
    pub key_points_en: Vec<String>,
    pub key_points_zh: Vec<String>,
    pub title_zh: Option<String>,
    pub lens_en: Option<String>,
    pub lens_zh: Option<String>,
}

impl StructuredFields {
    /// Schema validation: wrong enum value, array length out of bounds,
    /// or string over the length limit all yield `None` (the caller then
    /// falls back to heuristics, same as a transport failure).
    pub fn validated(raw: RawClassification) -> Option<Self> {
        let category = Category::parse(&raw.category)?;
        let importance = Importance::parse(&raw.importance)?;
        let sentiment = Sentiment::parse(&raw.sentiment)?;

        if raw.summary_en.chars().count() > MAX_SUMMARY_CHARS
            || raw.summary_zh.chars().count() > MAX_SUMMARY_CHARS
        {
            return None;
        }
        // Key points are 3..=5 when present; heuristics leave them empty.
        for kp in [&raw.key_points_en, &raw.key_points_zh] {
            if !kp.is_empty() && !(3..=5).contains(&kp.len()) {
                return None;
            }
        }
        if raw.symbols.len() > symbols::MAX_SYMBOLS {
            return None;
        }

        Some(Self {
            category,
            importance,
            sentiment,
            symbols: symbols::finalize_symbols(&raw.symbols),
            summary_en: raw.summary_en,
            summary_zh: raw.summary_zh,
            key_points_en: raw.key_points_en,
            key_points_zh: raw.key_points_zh,
            title_zh: raw.title_zh.filter(|s| !s.trim().is_empty()),
            lens_en: raw.lens_en.filter(|s| !s.trim().is_empty()),
            lens_zh: raw.lens_zh.filter(|s| !s.trim().is_empty()),
        })
    }
}

fn re_macro() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(fed|ecb|boj|boe|rate[s]?|inflation|cpi|ppi|gdp|payroll|employment|central bank|treasury|yield[s]?)\b").unwrap()
    })
}

fn re_crypto() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(bitcoin|btc|ethereum|crypto|token|blockchain|defi|stablecoin)\b")
            .unwrap()
    })
}

fn re_commodities() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(gold|silver|oil|crude|brent|copper|commodit\w*|opec)\b").unwrap()
    })
}

fn re_stocks() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(stock[s]?|share[s]?|equit\w*|earnings|nasdaq|dow|ipo)\b").unwrap()
    })
}

/// Keyword-family fallback when the AI result is absent. Families are
/// checked in a fixed order; "fx" is the default.
pub fn heuristic_category(text: &str) -> Category {
    if re_macro().is_match(text) {
        Category::Macro
    } else if re_crypto().is_match(text) {
        Category::Crypto
    } else if re_commodities().is_match(text) {
        Category::Commodities
    } else if re_stocks().is_match(text) {
        Category::Stocks
    } else {
        Category::Fx
    }
}
