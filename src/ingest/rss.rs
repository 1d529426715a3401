// src/ingest/rss.rs
//! RSS implementation of the feed-transport contract, plus a fixture
//! transport for tests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{FeedEntry, FeedTransport, Source};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an RSS body into feed entries. Entries with missing fields are
/// passed through as-is; the engine enforces title/link requirements.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let cleaned = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&cleaned).context("parsing rss xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        out.push(FeedEntry {
            title: it.title.unwrap_or_default(),
            link: it.link.unwrap_or_default(),
            content: it.content_encoded,
            snippet: it.description,
            author: it.creator,
            published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_entries_total").increment(out.len() as u64);
    Ok(out)
}

pub struct RssTransport {
    client: reqwest::Client,
}

impl RssTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("marketwire/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { client }
    }
}

impl Default for RssTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedTransport for RssTransport {
    async fn fetch(&self, source: &Source) -> Result<Vec<FeedEntry>> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("feed http get ({})", source.name))?;
        if !resp.status().is_success() {
            bail!("feed http status {} ({})", resp.status(), source.name);
        }
        let body = resp.text().await.context("feed http body")?;
        parse_feed(&body)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

/// Serves one embedded XML document for every source. Test-only wiring,
/// kept in the library so integration tests and local demos share it.
pub struct FixtureTransport {
    xml: String,
}

impl FixtureTransport {
    pub fn from_xml(xml: &str) -> Self {
        Self {
            xml: xml.to_string(),
        }
    }
}

#[async_trait]
impl FeedTransport for FixtureTransport {
    async fn fetch(&self, _source: &Source) -> Result<Vec<FeedEntry>> {
        parse_feed(&self.xml)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Feeds routinely embed bare HTML entities that are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
