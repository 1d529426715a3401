// src/normalize.rs
//! Link canonicalization and HTML-to-text cleanup used by the ingest
//! pipeline. `normalize_url` output is the dedup identity for raw items
//! and canonical articles, so it must be stable across tracking noise.

use url::Url;

/// Canonicalize a link for use as a dedup key: drop the fragment, remove
/// known tracking parameters, and sort the remaining query pairs by key
/// (stable, so equal keys keep their original relative order).
///
/// Never fails: if the input does not parse as an absolute URL, the
/// trimmed original is returned unchanged.
pub fn normalize_url(link: &str) -> String {
    let trimmed = link.trim();
    let mut parsed = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return trimmed.to_string(),
    };

    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    // Vec::sort_by is stable; equal keys keep feed order.
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &pairs {
            ser.append_pair(k, v);
        }
        parsed.set_query(Some(&ser.finish()));
    }

    parsed.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let k = key.to_ascii_lowercase();
    k.starts_with("utm_") || k == "gclid" || k == "fbclid"
}

/// Reduce raw feed HTML to plain text: entity decode, strip tags,
/// normalize curly quotes, collapse whitespace.
pub fn html_to_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Lowercased, dash-separated slug fragment capped at `max_chars`.
/// Non-alphanumeric runs collapse to a single dash; a fully non-ASCII
/// input (e.g. a CJK-only title) yields an empty string and the caller
/// must supply its own base.
pub fn slugify(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_dash = true; // suppress a leading dash
    for ch in s.chars() {
        if out.chars().count() >= max_chars {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_fragment_tracking_and_sorts() {
        let a = normalize_url("https://x.com/a?b=2&a=1&utm_source=x#frag");
        let b = normalize_url("https://x.com/a?a=1&b=2");
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_strips_gclid_and_fbclid() {
        let u = normalize_url("https://x.com/p?gclid=123&fbclid=456&id=7");
        assert_eq!(u, "https://x.com/p?id=7");
    }

    #[test]
    fn normalize_without_query_drops_bare_separator() {
        let u = normalize_url("https://x.com/p?utm_campaign=z");
        assert_eq!(u, "https://x.com/p");
    }

    #[test]
    fn unparseable_input_is_returned_trimmed() {
        assert_eq!(normalize_url("  not a url  "), "not a url");
    }

    #[test]
    fn html_to_text_strips_markup_and_entities() {
        let s = "<p>ECB&nbsp;holds <b>rates</b></p>";
        assert_eq!(html_to_text(s), "ECB holds rates");
    }

    #[test]
    fn slugify_collapses_and_caps() {
        assert_eq!(slugify("ECB Holds Rates!", 60), "ecb-holds-rates");
        assert_eq!(slugify("延续涨势", 60), "");
        let long = slugify(&"word ".repeat(40), 20);
        assert!(long.chars().count() <= 20);
    }
}
