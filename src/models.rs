use serde::{Deserialize, Serialize};

/// Overall health classification of a probed website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    Up,
    Down,
    Degraded,
}

impl WebsiteStatus {
    /// Error rate reported alongside the status
    pub fn error_rate(self) -> u8 {
        match self {
            WebsiteStatus::Up => 0,
            WebsiteStatus::Degraded => 5,
            WebsiteStatus::Down => 100,
        }
    }
}

/// Where a reported value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Measured,
    Estimated,
    Unavailable,
}

/// Latency phases in milliseconds. DNS, TCP and TLS are fixed shares of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingMetrics {
    pub dns_lookup: u64,
    pub tcp_connect: u64,
    pub tls_handshake: u64,
    pub ttfb: u64,
    pub download: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslInfo {
    pub valid: bool,
    pub expiry_date: Option<String>,
    pub days_until_expiry: Option<i64>,
    pub issuer: Option<String>,
    pub expiry_source: Provenance,
}

impl SslInfo {
    pub fn unavailable() -> Self {
        Self {
            valid: false,
            expiry_date: None,
            days_until_expiry: None,
            issuer: None,
            expiry_source: Provenance::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoreWebVitals {
    pub lcp: Option<u64>,
    pub fid: Option<u64>,
    pub cls: Option<f64>,
}

/// Scores from the external performance service, or the local estimate standing in for it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpeedResult {
    pub performance_score: Option<u8>,
    pub accessibility_score: Option<u8>,
    pub best_practices_score: Option<u8>,
    pub seo_score: Option<u8>,
    pub mobile_score: Option<u8>,
    pub desktop_score: Option<u8>,
    pub core_web_vitals: CoreWebVitals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceBreakdown {
    pub dns: u64,
    pub connect: u64,
    pub ttfb: u64,
    pub download: u64,
}

impl From<&TimingMetrics> for PerformanceBreakdown {
    fn from(timing: &TimingMetrics) -> Self {
        Self {
            dns: timing.dns_lookup,
            connect: timing.tcp_connect,
            ttfb: timing.ttfb,
            download: timing.download,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteMetrics {
    pub url: String,
    pub timestamp: String,
    pub status: WebsiteStatus,
    pub http_status_code: Option<u16>,
    pub response_time: Option<u64>,
    pub ttfb: Option<u64>,
    pub dns_lookup_time: Option<u64>,
    pub tcp_connect_time: Option<u64>,
    pub tls_handshake_time: Option<u64>,
    pub ssl_certificate: SslInfo,
    pub performance_score: Option<u8>,
    pub error_rate: u8,
    pub core_web_vitals: Option<CoreWebVitals>,
    pub mobile_score: Option<u8>,
    pub desktop_score: Option<u8>,
    pub accessibility_score: Option<u8>,
    pub best_practices_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lighthouse_seo_score: Option<u8>,
    pub score_source: Provenance,
    pub performance_breakdown: Option<PerformanceBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    /// Points deducted from the SEO score for one issue of this severity
    pub fn deduction(self) -> u32 {
        match self {
            IssueSeverity::High => 15,
            IssueSeverity::Medium => 8,
            IssueSeverity::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Technical,
    Content,
    Social,
    Performance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub issue: String,
    pub impact: String,
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextTag {
    pub present: bool,
    pub length: Option<usize>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headings {
    pub h1_count: usize,
    pub h2_count: usize,
    pub has_proper_structure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    pub total: usize,
    pub with_alt: usize,
    pub missing_alt: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub has_title: bool,
    pub has_description: bool,
    pub has_image: bool,
}

impl OpenGraph {
    pub fn is_complete(&self) -> bool {
        self.has_title && self.has_description && self.has_image
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TwitterCard {
    pub present: bool,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAnalysis {
    pub score: Option<u8>,
    pub title_tag: TextTag,
    pub meta_description: TextTag,
    pub headings: Headings,
    pub images: ImageStats,
    pub canonical_tag: bool,
    pub robots_txt: bool,
    pub sitemap: bool,
    pub mobile_friendly: bool,
    pub indexable: bool,
    pub open_graph: OpenGraph,
    pub twitter_card: TwitterCard,
    pub structured_data: bool,
    pub language: Option<String>,
    pub favicon: bool,
    pub compression: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub enhanced_issues: Vec<SeoIssue>,
}

/// The single artifact produced by one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringResult {
    pub website: WebsiteMetrics,
    pub seo: SeoAnalysis,
}
