// src/symbols.rs
//! Heuristic extraction of tradable-instrument codes from free text.
//! Used as the fallback whenever AI classification is unavailable or
//! returns no symbols, and to enrich AI output that omits them.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;

/// Hard cap on symbols per article.
pub const MAX_SYMBOLS: usize = 12;

/// Keyword → symbol map, matched case-insensitively as substrings.
/// Short tokens ("btc", "xau") are safe enough here; ambiguous ones
/// ("eth", "oil") are spelled out to avoid accidental hits.
static KEYWORD_SYMBOLS: &[(&str, &str)] = &[
    ("gold", "XAUUSD"),
    ("xau", "XAUUSD"),
    ("silver", "XAGUSD"),
    ("xag", "XAGUSD"),
    ("bitcoin", "BTCUSD"),
    ("btc", "BTCUSD"),
    ("ethereum", "ETHUSD"),
    ("crude", "USOIL"),
    ("wti", "USOIL"),
    ("brent", "UKOIL"),
    ("nasdaq", "NDX"),
    ("s&p 500", "SPX"),
    ("sp500", "SPX"),
    ("dow jones", "DJI"),
    ("nikkei", "JP225"),
    ("dax", "DE40"),
];

fn re_pair() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b([a-z]{3})\s*/\s*([a-z]{3})\b").unwrap())
}

fn re_six_upper() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{6}\b").unwrap())
}

/// Uppercase a raw code and strip pair separators (`EUR/USD` → `EURUSD`).
pub fn normalize_symbol(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '/' && *c != '-')
        .collect::<String>()
        .trim()
        .to_ascii_uppercase()
}

/// Normalize, dedup (first occurrence wins), and cap a symbol list.
pub fn finalize_symbols<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for s in raw {
        let sym = normalize_symbol(s.as_ref());
        if sym.is_empty() || !seen.insert(sym.clone()) {
            continue;
        }
        out.push(sym);
        if out.len() >= MAX_SYMBOLS {
            break;
        }
    }
    out
}

/// Extract instrument codes from free text, in discovery order:
/// 1) `XXX/YYY` currency pairs, 2) bare six-uppercase-letter tokens,
/// 3) keyword map hits.
pub fn extract_symbols(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for cap in re_pair().captures_iter(text) {
        found.push(format!("{}{}", &cap[1], &cap[2]));
    }

    for m in re_six_upper().find_iter(text) {
        found.push(m.as_str().to_string());
    }

    let lower = text.to_lowercase();
    for (kw, sym) in KEYWORD_SYMBOLS {
        if lower.contains(kw) {
            found.push((*sym).to_string());
        }
    }

    finalize_symbols(found)
}
