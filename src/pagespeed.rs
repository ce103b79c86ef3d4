//! Adapter for the PageSpeed Insights (Lighthouse) scoring API.
//!
//! Every failure mode (no key, transport error, timeout, non-2xx, unparsable body) resolves to
//! `None`; callers fall back to [`crate::estimator`].

use crate::models::{CoreWebVitals, PageSpeedResult};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageSpeedSettings {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub include_seo: bool,
}

impl PageSpeedSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            include_seo: false,
        }
    }
}

/// Scores of a single Lighthouse run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LighthouseScores {
    pub performance: Option<u8>,
    pub accessibility: Option<u8>,
    pub best_practices: Option<u8>,
    pub seo: Option<u8>,
    pub core_web_vitals: CoreWebVitals,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpeedResponse {
    lighthouse_result: Option<LighthouseReport>,
}

#[derive(Deserialize)]
struct LighthouseReport {
    #[serde(default)]
    categories: Categories,
    #[serde(default)]
    audits: HashMap<String, Audit>,
}

#[derive(Deserialize, Default)]
struct Categories {
    performance: Option<Category>,
    accessibility: Option<Category>,
    #[serde(rename = "best-practices")]
    best_practices: Option<Category>,
    seo: Option<Category>,
}

#[derive(Deserialize)]
struct Category {
    score: Option<f64>,
}

#[derive(Deserialize)]
struct Audit {
    #[serde(rename = "numericValue")]
    numeric_value: Option<f64>,
}

pub struct PageSpeedClient {
    client: Client,
    settings: Option<PageSpeedSettings>,
}

impl PageSpeedClient {
    /// `settings` is `None` when no API key is configured
    pub fn new(client: Client, settings: Option<PageSpeedSettings>) -> Self {
        let settings = settings.filter(|s| !s.api_key.trim().is_empty());
        Self { client, settings }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    /// Runs the mobile and desktop strategies concurrently and merges them
    pub async fn analyze(&self, url: &Url) -> Option<PageSpeedResult> {
        let Some(settings) = &self.settings else {
            tracing::debug!("PageSpeed API key not configured, using estimated scores");
            return None;
        };

        let (mobile, desktop) = futures::future::join(
            self.run(settings, url, Strategy::Mobile),
            self.run(settings, url, Strategy::Desktop),
        )
        .await;

        merge_strategies(mobile, desktop)
    }

    async fn run(
        &self,
        settings: &PageSpeedSettings,
        url: &Url,
        strategy: Strategy,
    ) -> Option<LighthouseScores> {
        let mut query: Vec<(&str, &str)> = vec![
            ("url", url.as_str()),
            ("key", settings.api_key.as_str()),
            ("category", "performance"),
            ("category", "accessibility"),
            ("category", "best-practices"),
        ];
        if settings.include_seo {
            query.push(("category", "seo"));
        }
        query.push(("strategy", strategy.as_str()));

        let response = match self
            .client
            .get(&settings.endpoint)
            .query(&query)
            .timeout(settings.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(strategy = strategy.as_str(), error = %e, "PageSpeed request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                strategy = strategy.as_str(),
                status = %response.status(),
                "PageSpeed API returned an error status"
            );
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(strategy = strategy.as_str(), error = %e, "Failed to read PageSpeed response");
                return None;
            }
        };

        let scores = parse_report(&body);
        if scores.is_none() {
            tracing::warn!(strategy = strategy.as_str(), "Unparsable PageSpeed response");
        }
        scores
    }
}

/// Extracts category scores and Core Web Vitals from a `runPagespeed` response body
pub fn parse_report(body: &str) -> Option<LighthouseScores> {
    let response: PageSpeedResponse = serde_json::from_str(body).ok()?;
    let report = response.lighthouse_result?;

    let audit = |name: &str| {
        report
            .audits
            .get(name)
            .and_then(|a| a.numeric_value)
            .filter(|v| v.is_finite() && *v >= 0.0)
    };

    Some(LighthouseScores {
        performance: category_score(report.categories.performance.as_ref()),
        accessibility: category_score(report.categories.accessibility.as_ref()),
        best_practices: category_score(report.categories.best_practices.as_ref()),
        seo: category_score(report.categories.seo.as_ref()),
        core_web_vitals: CoreWebVitals {
            lcp: audit("largest-contentful-paint").map(|v| v.round() as u64),
            fid: audit("max-potential-fid").map(|v| v.round() as u64),
            cls: audit("cumulative-layout-shift").map(|v| (v * 1000.0).round() / 1000.0),
        },
    })
}

/// Converts a 0-1 category score into 0-100
fn category_score(category: Option<&Category>) -> Option<u8> {
    category
        .and_then(|c| c.score)
        .filter(|s| s.is_finite())
        .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as u8)
}

/// Combines the two strategy runs; mobile is the primary source for shared fields
pub fn merge_strategies(
    mobile: Option<LighthouseScores>,
    desktop: Option<LighthouseScores>,
) -> Option<PageSpeedResult> {
    let mobile_score = mobile.as_ref().and_then(|m| m.performance);
    let desktop_score = desktop.as_ref().and_then(|d| d.performance);
    let primary = mobile.or(desktop)?;

    Some(PageSpeedResult {
        performance_score: primary.performance,
        accessibility_score: primary.accessibility,
        best_practices_score: primary.best_practices,
        seo_score: primary.seo,
        mobile_score,
        desktop_score,
        core_web_vitals: primary.core_web_vitals,
    })
}
