use crate::error::{ProbeError, Result};
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;

/// Identifies the probe to the sites it checks
pub const USER_AGENT: &str = concat!(
    "webpulse/",
    env!("CARGO_PKG_VERSION"),
    " (Website Monitoring Bot)"
);
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
/// Sent explicitly by the page client, which decodes bodies itself
pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";

fn default_headers() -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    headers
}

/// Client for the primary page fetch.
///
/// Transparent decompression is disabled so the `Content-Encoding` response header survives
/// for the compression check; the fetcher decodes the body itself.
pub fn build_page_client(timeout: Duration) -> Result<Client> {
    let mut headers = default_headers();
    headers.insert(
        header::ACCEPT_ENCODING,
        header::HeaderValue::from_static(ACCEPT_ENCODING),
    );

    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(false)
        .brotli(false)
        .deflate(false)
        .build()
        .map_err(ProbeError::Client)
}

/// Client for HEAD probes and the PageSpeed API
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .default_headers(default_headers())
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(ProbeError::Client)
}
