use crate::error::{ProbeError, Result};
use crate::models::TimingMetrics;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use reqwest::header::{CONTENT_ENCODING, HeaderMap};
use reqwest::{Client, StatusCode};
use std::io::Read;
use std::time::{Duration, Instant};
use url::Url;

const DNS_SHARE: f64 = 0.05;
const TCP_SHARE: f64 = 0.10;
const TLS_SHARE: f64 = 0.15;

/// Largest body read from the wire, and largest body kept after decoding
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Result of the primary page fetch
#[derive(Debug)]
pub struct FetchedPage {
    pub status: StatusCode,
    /// URL after redirects
    pub final_url: Url,
    pub headers: HeaderMap,
    pub body: String,
    pub timing: TimingMetrics,
}

/// Fetches `url` with GET, following redirects, and records when headers and the full body
/// arrived.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage> {
    fetch_page_limited(client, url, MAX_BODY_BYTES).await
}

/// Like [`fetch_page`], but stops reading once `limit` bytes have arrived. The truncated body
/// is still decoded and analyzed.
pub async fn fetch_page_limited(client: &Client, url: &Url, limit: usize) -> Result<FetchedPage> {
    let start = Instant::now();

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| ProbeError::Fetch {
            url: url.to_string(),
            source,
        })?;
    let first_byte = start.elapsed();

    let status = response.status();
    let headers = response.headers().clone();
    let final_url = response.url().clone();

    let mut raw: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|source| ProbeError::Fetch {
        url: url.to_string(),
        source,
    })? {
        let room = limit - raw.len();
        if chunk.len() >= room {
            raw.extend_from_slice(&chunk[..room]);
            let more = chunk.len() > room
                || response.content_length().is_some_and(|n| n > limit as u64);
            if more {
                tracing::warn!(url = %url, limit, "Page body truncated");
            }
            break;
        }
        raw.extend_from_slice(&chunk);
    }
    let end = start.elapsed();

    let encoding = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let body = decode_body(&raw, encoding);

    let timing = apportion_timing(millis(first_byte), millis(end), url.scheme() == "https");

    tracing::debug!(
        url = %url,
        status = status.as_u16(),
        total_ms = timing.total,
        bytes = raw.len(),
        "Fetched page"
    );

    Ok(FetchedPage {
        status,
        final_url,
        headers,
        body,
        timing,
    })
}

fn millis(duration: Duration) -> u64 {
    (duration.as_secs_f64() * 1000.0).round() as u64
}

/// Splits a measured request into phases.
///
/// Only `ttfb` and `total` are measured. DNS, TCP and TLS are fixed shares of the total
/// (5%, 10% and 15%, TLS only for HTTPS) and `download` is whatever follows the first byte,
/// so `total == ttfb + download` always holds.
pub fn apportion_timing(ttfb: u64, total: u64, is_https: bool) -> TimingMetrics {
    let ttfb = ttfb.min(total);
    let share = |fraction: f64| (total as f64 * fraction).round() as u64;

    TimingMetrics {
        dns_lookup: share(DNS_SHARE),
        tcp_connect: share(TCP_SHARE),
        tls_handshake: if is_https { share(TLS_SHARE) } else { 0 },
        ttfb,
        download: total - ttfb,
        total,
    }
}

/// Decodes a body according to its `Content-Encoding`, falling back to the raw bytes.
///
/// Stacked codings (`gzip, br`) are undone last-applied first. The decoded body is capped at
/// [`MAX_BODY_BYTES`].
pub fn decode_body(raw: &[u8], content_encoding: &str) -> String {
    let codings: Vec<String> = content_encoding
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty() && c != "identity")
        .collect();

    if codings.is_empty() {
        return String::from_utf8_lossy(raw).into_owned();
    }

    let mut bytes = raw.to_vec();
    for coding in codings.iter().rev() {
        match decode_one(&bytes, coding) {
            Ok(decoded) => bytes = decoded,
            Err(e) => {
                tracing::warn!(
                    encoding = %content_encoding,
                    coding = %coding,
                    error = %e,
                    "Failed to decode body, using raw bytes"
                );
                return String::from_utf8_lossy(raw).into_owned();
            }
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

fn decode_one(bytes: &[u8], coding: &str) -> std::io::Result<Vec<u8>> {
    match coding {
        "gzip" | "x-gzip" => read_capped(GzDecoder::new(bytes)),
        // Servers disagree on whether "deflate" carries the zlib wrapper
        "deflate" => read_capped(ZlibDecoder::new(bytes))
            .or_else(|_| read_capped(DeflateDecoder::new(bytes))),
        "br" => read_capped(brotli::Decompressor::new(bytes, 4096)),
        other => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("unsupported content coding {other}"),
        )),
    }
}

fn read_capped(reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.take(MAX_BODY_BYTES as u64).read_to_end(&mut out)?;
    Ok(out)
}
