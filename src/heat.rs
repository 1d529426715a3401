// src/heat.rs
//! Trending score for "hot" list ordering. Ranking-only: never
//! persisted as ground truth. Monotonic in recency and in engagement;
//! ties break newer-first.

use chrono::{DateTime, Utc};

use crate::ingest::types::{Article, EngagementMetrics};

/// Tunable scoring constants; defaults are a starting point, not a
/// contract.
#[derive(Debug, Clone, Copy)]
pub struct HeatConfig {
    pub half_life_hours: f64,
    pub click_weight: f64,
    pub recency_scale: f64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            half_life_hours: 12.0,
            click_weight: 3.0,
            recency_scale: 100.0,
        }
    }
}

/// Exponential recency decay plus logarithmic engagement. An upstream
/// precomputed heat, when attached to the article, is returned as-is.
pub fn compute_heat(
    article: &Article,
    metrics: &EngagementMetrics,
    now: DateTime<Utc>,
    cfg: &HeatConfig,
) -> f64 {
    if let Some(h) = article.heat {
        return h;
    }
    let age_hours = (now - article.published_at).num_seconds().max(0) as f64 / 3600.0;
    let recency = 0.5_f64.powf(age_hours / cfg.half_life_hours);
    let engagement =
        (1.0 + metrics.views as f64 + cfg.click_weight * metrics.clicks as f64).ln();
    cfg.recency_scale * recency + engagement
}

/// Order a published list for display: heat descending, then newest
/// first on equal heat.
pub fn hot_order(
    mut items: Vec<(Article, EngagementMetrics)>,
    now: DateTime<Utc>,
    cfg: &HeatConfig,
) -> Vec<(Article, f64)> {
    items.sort_by(|(a, am), (b, bm)| {
        let ha = compute_heat(a, am, now, cfg);
        let hb = compute_heat(b, bm, now, cfg);
        hb.partial_cmp(&ha)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
    items
        .into_iter()
        .map(|(a, m)| {
            let h = compute_heat(&a, &m, now, cfg);
            (a, h)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Importance, Sentiment};
    use crate::ingest::types::Status;
    use chrono::Duration;

    fn article(age_hours: i64, heat: Option<f64>) -> Article {
        Article {
            slug: format!("a-{age_hours}"),
            url: format!("https://x.com/{age_hours}"),
            source_name: "wire".into(),
            title_en: "t".into(),
            title_zh: None,
            summary_en: None,
            summary_zh: None,
            content_en: None,
            content_zh: None,
            category: Category::Fx,
            importance: Importance::Medium,
            sentiment: Sentiment::Neutral,
            symbols: vec![],
            key_points_en: vec![],
            key_points_zh: vec![],
            lens_en: None,
            lens_zh: None,
            status: Status::Published,
            lang_fallback: false,
            published_at: Utc::now() - Duration::hours(age_hours),
            heat,
        }
    }

    fn m(views: u64, clicks: u64) -> EngagementMetrics {
        EngagementMetrics {
            views,
            clicks,
            avg_dwell_seconds: 0.0,
        }
    }

    #[test]
    fn newer_scores_higher_all_else_equal() {
        let now = Utc::now();
        let cfg = HeatConfig::default();
        let newer = compute_heat(&article(1, None), &m(10, 1), now, &cfg);
        let older = compute_heat(&article(24, None), &m(10, 1), now, &cfg);
        assert!(newer > older);
    }

    #[test]
    fn more_engagement_scores_higher_all_else_equal() {
        let now = Utc::now();
        let cfg = HeatConfig::default();
        let busy = compute_heat(&article(6, None), &m(500, 40), now, &cfg);
        let quiet = compute_heat(&article(6, None), &m(2, 0), now, &cfg);
        assert!(busy > quiet);
    }

    #[test]
    fn precomputed_heat_is_honored() {
        let now = Utc::now();
        let cfg = HeatConfig::default();
        assert_eq!(compute_heat(&article(1, Some(7.5)), &m(9999, 0), now, &cfg), 7.5);
    }

    #[test]
    fn hot_order_breaks_ties_newer_first() {
        let now = Utc::now();
        let cfg = HeatConfig::default();
        // Identical precomputed heat forces the tie-break.
        let old = article(30, Some(50.0));
        let new = article(2, Some(50.0));
        let ordered = hot_order(vec![(old, m(0, 0)), (new, m(0, 0))], now, &cfg);
        assert_eq!(ordered[0].0.slug, "a-2");
        assert_eq!(ordered[1].0.slug, "a-30");
    }
}
