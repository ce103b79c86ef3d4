use crate::models::{Provenance, SslInfo};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;
use reqwest::Client;
use url::Url;

/// Range of simulated days until certificate expiry
const EXPIRY_DAYS: std::ops::Range<i64> = 90..365;

/// Checks HTTPS reachability for `url`.
///
/// No certificate is read: validity is the success of a HEAD request and the expiry is a
/// synthetic value, reported with `expiry_source = estimated`. Plain HTTP targets are never
/// contacted.
pub async fn inspect(client: &Client, url: &Url) -> SslInfo {
    if url.scheme() != "https" {
        return SslInfo::unavailable();
    }

    match client.head(url.clone()).send().await {
        Ok(response) => {
            let valid = response.status().is_success();
            estimated_certificate(valid, &mut rand::thread_rng())
        }
        Err(e) => {
            tracing::info!(url = %url, error = %e, "HTTPS HEAD request failed");
            SslInfo::unavailable()
        }
    }
}

/// Builds the placeholder certificate info for a reachable HTTPS site
pub fn estimated_certificate(valid: bool, rng: &mut impl Rng) -> SslInfo {
    let days = rng.gen_range(EXPIRY_DAYS);
    let expiry = Utc::now() + ChronoDuration::days(days);

    SslInfo {
        valid,
        expiry_date: Some(expiry.to_rfc3339_opts(SecondsFormat::Millis, true)),
        days_until_expiry: Some(days),
        issuer: None,
        expiry_source: Provenance::Estimated,
    }
}
