use crate::error::{ProbeError, Result};
use crate::estimator;
use crate::fetcher;
use crate::http_client::{build_http_client, build_page_client};
use crate::models::{
    MonitoringResult, PerformanceBreakdown, Provenance, SeoAnalysis, SslInfo, WebsiteMetrics,
    WebsiteStatus,
};
use crate::pagespeed::{PageSpeedClient, PageSpeedSettings};
use crate::probes;
use crate::seo_analyzer::SeoAnalyzer;
use crate::ssl_inspector;
use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use url::Url;

/// Responses slower than this are reported as degraded
pub const SLOW_RESPONSE_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(45);

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Timeout for the page fetch and each HEAD probe
    pub request_timeout: Duration,
    /// Deadline shared by all concurrent calls of one probe
    pub deadline: Duration,
    /// `None` disables the PageSpeed API
    pub pagespeed: Option<PageSpeedSettings>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            deadline: DEFAULT_DEADLINE,
            pagespeed: None,
        }
    }
}

/// Runs one website probe per call. Holds only HTTP clients, no per-probe state.
pub struct Monitor {
    page_client: reqwest::Client,
    probe_client: reqwest::Client,
    pagespeed: PageSpeedClient,
    deadline: Duration,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let page_client = build_page_client(config.request_timeout)?;
        let probe_client = build_http_client(config.request_timeout)?;
        let pagespeed_timeout = config
            .pagespeed
            .as_ref()
            .map_or(crate::pagespeed::DEFAULT_TIMEOUT, |s| s.timeout);
        let pagespeed =
            PageSpeedClient::new(build_http_client(pagespeed_timeout)?, config.pagespeed);

        Ok(Self {
            page_client,
            probe_client,
            pagespeed,
            deadline: config.deadline,
        })
    }

    /// Whether a usable PageSpeed API key is configured
    pub fn uses_pagespeed(&self) -> bool {
        self.pagespeed.is_configured()
    }

    /// Probes `raw_url` and assembles a complete result.
    ///
    /// Only invalid input is returned as an error. Fetch, probe and PageSpeed failures all
    /// degrade into the result itself.
    pub async fn check(&self, raw_url: &str) -> Result<MonitoringResult> {
        let url = normalize_url(raw_url)?;
        let origin = origin_of(&url)?;
        let deadline = Instant::now() + self.deadline;

        tracing::info!(url = %url, "Starting probe");

        let (fetch_result, ssl, robots_txt, sitemap, pagespeed) = tokio::join!(
            timeout_at(deadline, fetcher::fetch_page(&self.page_client, &url)),
            timeout_at(deadline, ssl_inspector::inspect(&self.probe_client, &url)),
            timeout_at(deadline, probes::has_robots_txt(&self.probe_client, &origin)),
            timeout_at(deadline, probes::has_sitemap(&self.probe_client, &origin)),
            timeout_at(deadline, self.pagespeed.analyze(&url)),
        );

        let ssl = ssl.unwrap_or_else(|_| SslInfo::unavailable());
        let robots_txt = robots_txt.unwrap_or(false);
        let sitemap = sitemap.unwrap_or(false);
        let pagespeed = pagespeed.unwrap_or_else(|_| {
            tracing::warn!(url = %url, "PageSpeed call cut off by probe deadline");
            None
        });

        let page = match fetch_result {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Failed to fetch website");
                return Ok(down_result(&url, ssl, robots_txt, sitemap));
            }
            Err(_) => {
                let e = ProbeError::Timeout(self.deadline);
                tracing::warn!(url = %url, error = %e, "Failed to fetch website");
                return Ok(down_result(&url, ssl, robots_txt, sitemap));
            }
        };

        let mut seo = SeoAnalyzer::analyze(&page.body, &page.final_url, &page.headers);
        seo.robots_txt = robots_txt;
        seo.sitemap = sitemap;

        let (scores, score_source) = match pagespeed {
            Some(scores) => (scores, Provenance::Measured),
            None => (
                estimator::estimate(page.timing.total, &mut rand::thread_rng()),
                Provenance::Estimated,
            ),
        };

        let status = classify_status(page.status, page.timing.total);
        tracing::info!(
            url = %url,
            status = ?status,
            http_status = page.status.as_u16(),
            total_ms = page.timing.total,
            "Probe complete"
        );

        Ok(MonitoringResult {
            website: WebsiteMetrics {
                url: url.to_string(),
                timestamp: now(),
                status,
                http_status_code: Some(page.status.as_u16()),
                response_time: Some(page.timing.total),
                ttfb: Some(page.timing.ttfb),
                dns_lookup_time: Some(page.timing.dns_lookup),
                tcp_connect_time: Some(page.timing.tcp_connect),
                tls_handshake_time: Some(page.timing.tls_handshake),
                ssl_certificate: ssl,
                performance_score: scores.performance_score,
                error_rate: status.error_rate(),
                core_web_vitals: Some(scores.core_web_vitals),
                mobile_score: scores.mobile_score,
                desktop_score: scores.desktop_score,
                accessibility_score: scores.accessibility_score,
                best_practices_score: scores.best_practices_score,
                lighthouse_seo_score: scores.seo_score,
                score_source,
                performance_breakdown: Some(PerformanceBreakdown::from(&page.timing)),
            },
            seo,
        })
    }
}

/// Adds `https://` when no scheme is given and validates the result
pub fn normalize_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::MissingUrl);
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ProbeError::InvalidUrl(format!("{trimmed}: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ProbeError::InvalidUrl(format!("{trimmed}: missing host")));
    }

    Ok(url)
}

/// Scheme, host and port of `url`, used for the robots.txt and sitemap probes
pub fn origin_of(url: &Url) -> Result<Url> {
    Url::parse(&url.origin().ascii_serialization())
        .map_err(|e| ProbeError::InvalidUrl(format!("{url}: {e}")))
}

pub fn classify_status(status: StatusCode, total_ms: u64) -> WebsiteStatus {
    // Anything from 500 up, including the non-standard 6xx-9xx range
    if status.as_u16() >= 500 {
        WebsiteStatus::Down
    } else if !status.is_success() || total_ms > SLOW_RESPONSE_MS {
        WebsiteStatus::Degraded
    } else {
        WebsiteStatus::Up
    }
}

/// Complete result for a site whose page could not be fetched
pub fn down_result(url: &Url, ssl: SslInfo, robots_txt: bool, sitemap: bool) -> MonitoringResult {
    MonitoringResult {
        website: WebsiteMetrics {
            url: url.to_string(),
            timestamp: now(),
            status: WebsiteStatus::Down,
            http_status_code: None,
            response_time: None,
            ttfb: None,
            dns_lookup_time: None,
            tcp_connect_time: None,
            tls_handshake_time: None,
            ssl_certificate: ssl,
            performance_score: None,
            error_rate: WebsiteStatus::Down.error_rate(),
            core_web_vitals: None,
            mobile_score: None,
            desktop_score: None,
            accessibility_score: None,
            best_practices_score: None,
            lighthouse_seo_score: None,
            score_source: Provenance::Unavailable,
            performance_breakdown: None,
        },
        seo: SeoAnalysis {
            robots_txt,
            sitemap,
            issues: vec!["Failed to fetch website".to_string()],
            ..Default::default()
        },
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https() {
        let url = normalize_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");

        let url = normalize_url("  http://example.com/page  ").unwrap();
        assert_eq!(url.as_str(), "http://example.com/page");

        let url = normalize_url("HTTPS://Example.com").unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(matches!(normalize_url(""), Err(ProbeError::MissingUrl)));
        assert!(matches!(normalize_url("   "), Err(ProbeError::MissingUrl)));
        assert!(matches!(
            normalize_url("http://"),
            Err(ProbeError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_url("exa mple.com"),
            Err(ProbeError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_origin_is_idempotent_over_scheme_prefix() {
        let bare = origin_of(&normalize_url("example.com").unwrap()).unwrap();
        let full = origin_of(&normalize_url("https://example.com").unwrap()).unwrap();
        assert_eq!(bare, full);
        assert_eq!(bare.as_str(), "https://example.com/");
    }

    #[test]
    fn test_origin_keeps_port_and_drops_path() {
        let url = normalize_url("http://127.0.0.1:8080/a/b?c=d").unwrap();
        assert_eq!(origin_of(&url).unwrap().as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, 100),
            WebsiteStatus::Down
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, 100),
            WebsiteStatus::Degraded
        );
        assert_eq!(
            classify_status(StatusCode::from_u16(600).unwrap(), 100),
            WebsiteStatus::Down
        );
        assert_eq!(
            classify_status(StatusCode::from_u16(999).unwrap(), 100),
            WebsiteStatus::Down
        );
        assert_eq!(
            classify_status(StatusCode::from_u16(499).unwrap(), 100),
            WebsiteStatus::Degraded
        );
        assert_eq!(classify_status(StatusCode::OK, 5000), WebsiteStatus::Degraded);
        assert_eq!(classify_status(StatusCode::OK, 3000), WebsiteStatus::Up);
        assert_eq!(classify_status(StatusCode::OK, 200), WebsiteStatus::Up);
    }

    #[test]
    fn test_down_result_shape() {
        let url = normalize_url("example.com").unwrap();
        let result = down_result(&url, SslInfo::unavailable(), true, false);

        assert_eq!(result.website.status, WebsiteStatus::Down);
        assert_eq!(result.website.response_time, None);
        assert_eq!(result.website.error_rate, 100);
        assert_eq!(result.website.score_source, Provenance::Unavailable);
        assert_eq!(result.seo.score, None);
        assert!(result.seo.robots_txt);
        assert!(!result.seo.sitemap);
        assert_eq!(result.seo.issues, vec!["Failed to fetch website"]);
    }
}
