use crate::models::{
    Headings, ImageStats, IssueCategory, IssueSeverity, OpenGraph, SeoAnalysis, SeoIssue,
    TextTag, TwitterCard,
};
use once_cell::sync::Lazy;
use reqwest::header::{CONTENT_ENCODING, HeaderMap};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

const TITLE_MAX: usize = 60;
const TITLE_MIN: usize = 30;
const META_DESC_MAX: usize = 160;
const META_DESC_MIN: usize = 120;
const MISSING_ALT_HIGH: usize = 5;

// Cached selectors to avoid repeated parsing and eliminate unwrap() calls
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector should be valid"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta").expect("meta selector should be valid"));
static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("h1 selector should be valid"));
static H2_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2").expect("h2 selector should be valid"));
static H3_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3").expect("h3 selector should be valid"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("img selector should be valid"));
static LINK_REL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel]").expect("link[rel] selector should be valid"));
static HTML_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("html").expect("html selector should be valid"));
static SCRIPT_TYPE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type]").expect("script[type] selector should be valid")
});
static MICRODATA_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[itemscope], [itemtype]").expect("microdata selector should be valid")
});

pub struct SeoAnalyzer;

impl SeoAnalyzer {
    /// Extracts the SEO signals of one page and scores it.
    ///
    /// `robots_txt` and `sitemap` are left `false`; they come from separate probes.
    pub fn analyze(html: &str, url: &Url, headers: &HeaderMap) -> SeoAnalysis {
        let document = Html::parse_document(html);
        let mut report = Findings::default();

        let title_tag = Self::check_title(&document, &mut report);
        let meta_description = Self::check_meta_description(&document, &mut report);
        let headings = Self::check_headings(&document, &mut report);
        let images = Self::check_images(&document, &mut report);
        let canonical_tag = Self::check_canonical(&document, &mut report);
        let mobile_friendly = Self::check_viewport(&document, html, &mut report);
        let indexable = Self::check_indexability(&document, &mut report);
        let open_graph = Self::check_open_graph(&document, &mut report);
        let twitter_card = Self::check_twitter_card(&document, &mut report);
        let structured_data = Self::check_structured_data(&document, &mut report);
        let language = Self::check_language(&document, &mut report);
        let favicon = Self::check_favicon(&document, &mut report);
        let compression = Self::check_compression(headers, &mut report);

        let analysis = report.finish(SeoAnalysis {
            score: None,
            title_tag,
            meta_description,
            headings,
            images,
            canonical_tag,
            robots_txt: false,
            sitemap: false,
            mobile_friendly,
            indexable,
            open_graph,
            twitter_card,
            structured_data,
            language,
            favicon,
            compression,
            issues: vec![],
            recommendations: vec![],
            enhanced_issues: vec![],
        });

        tracing::debug!(
            url = %url,
            score = ?analysis.score,
            issues = analysis.enhanced_issues.len(),
            "SEO analysis complete"
        );

        analysis
    }

    /// Score for a list of issues: 100 minus each issue's deduction, clamped to 0..=100
    pub fn score(issues: &[SeoIssue]) -> u8 {
        let deductions: u32 = issues.iter().map(|i| i.severity.deduction()).sum();
        100u32.saturating_sub(deductions) as u8
    }

    fn check_title(document: &Html, report: &mut Findings) -> TextTag {
        let content = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());

        let Some(title) = content else {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::High,
                "Missing title tag",
                "Search engines and browsers have no page title to display",
                "Add a descriptive title tag (50-60 characters) including primary keywords",
            );
            return TextTag::default();
        };

        let length = title.chars().count();
        if length > TITLE_MAX {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::Medium,
                "Title tag too long (>60 characters)",
                "Long titles are truncated in search results",
                "Shorten the title to 50-60 characters",
            );
        } else if length < TITLE_MIN {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::Low,
                "Title tag too short (<30 characters)",
                "Short titles miss keyword and click-through opportunities",
                "Expand the title tag to 50-60 characters",
            );
        }

        if title.chars().any(|c| c.is_ascii_alphabetic()) && max_word_repeats(&title) > 2 {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::Low,
                "Possible keyword stuffing in title tag",
                "Repeated keywords can be treated as spam",
                "Avoid repeating keywords excessively in the title tag",
            );
        }

        TextTag {
            present: true,
            length: Some(length),
            content: Some(title),
        }
    }

    fn check_meta_description(document: &Html, report: &mut Findings) -> TextTag {
        let content = meta_content(document, "description")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let Some(description) = content else {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::High,
                "Missing meta description",
                "Search engines generate their own snippet, lowering click-through rates",
                "Add a compelling meta description (150-160 characters) with a call-to-action",
            );
            return TextTag::default();
        };

        let length = description.chars().count();
        if length > META_DESC_MAX {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::Medium,
                "Meta description too long (>160 characters)",
                "The description will be truncated in search results",
                "Reduce the meta description to 150-160 characters",
            );
        } else if length < META_DESC_MIN {
            report.recommend(
                "Consider expanding the meta description for better engagement (currently <120 characters)",
            );
        }

        if description.to_lowercase().contains("welcome to") {
            report.recommend("Avoid generic phrases like \"Welcome to\" in the meta description");
        }

        TextTag {
            present: true,
            length: Some(length),
            content: Some(description),
        }
    }

    fn check_headings(document: &Html, report: &mut Findings) -> Headings {
        let h1_count = document.select(&H1_SELECTOR).count();
        let h2_count = document.select(&H2_SELECTOR).count();
        let h3_count = document.select(&H3_SELECTOR).count();

        if h1_count == 0 {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::High,
                "Missing H1 tag",
                "The main topic of the page is unclear to search engines and screen readers",
                "Add exactly one H1 tag describing the main page content",
            );
        } else if h1_count > 1 {
            report.issue(
                IssueCategory::Content,
                IssueSeverity::Medium,
                format!("Multiple H1 tags detected ({})", h1_count),
                "Competing top-level headings can confuse search engines",
                "Use only one H1 tag per page and H2-H6 for subheadings",
            );
        }

        if h2_count == 0 {
            report.recommend("Add H2 subheadings to structure content and improve readability");
        } else if h2_count > 2 && h3_count == 0 {
            report.recommend("Consider using H3 tags for deeper content organization");
        }

        Headings {
            h1_count,
            h2_count,
            has_proper_structure: h1_count == 1 && h2_count > 0,
        }
    }

    fn check_images(document: &Html, report: &mut Findings) -> ImageStats {
        let mut total = 0;
        let mut with_alt = 0;
        let mut empty_alt = 0;
        let mut lazy = 0;

        for img in document.select(&IMG_SELECTOR) {
            total += 1;
            match img.value().attr("alt") {
                Some(alt) if !alt.is_empty() => with_alt += 1,
                Some(_) => empty_alt += 1,
                None => {}
            }
            if attr_eq(&img, "loading", "lazy") {
                lazy += 1;
            }
        }

        let missing_alt = total - with_alt;
        if missing_alt > 0 {
            let severity = if missing_alt > MISSING_ALT_HIGH {
                IssueSeverity::High
            } else {
                IssueSeverity::Medium
            };
            report.issue(
                IssueCategory::Content,
                severity,
                format!("{} image(s) missing ALT attributes", missing_alt),
                "Images without ALT text are invisible to screen readers and image search",
                "Add descriptive ALT text to all images",
            );
        }

        if empty_alt > 0 && empty_alt < 3 {
            report.recommend(
                "Consider adding descriptive ALT text instead of empty attributes for decorative images",
            );
        }

        if lazy == 0 && total > 3 {
            report.recommend("Implement lazy loading for images to improve page load speed");
        }

        ImageStats {
            total,
            with_alt,
            missing_alt,
        }
    }

    fn check_canonical(document: &Html, report: &mut Findings) -> bool {
        let count = link_rel_count(document, "canonical");

        if count == 0 {
            report.issue(
                IssueCategory::Technical,
                IssueSeverity::Medium,
                "Missing canonical tag",
                "Duplicate URLs may split ranking signals",
                "Add a canonical link tag pointing to the preferred URL",
            );
        } else if count > 1 {
            report.note(
                "Multiple canonical tags found - Can confuse search engines",
                "Use only one canonical tag per page",
            );
        }

        count > 0
    }

    fn check_viewport(document: &Html, html: &str, report: &mut Findings) -> bool {
        let has_viewport = meta_content(document, "viewport").is_some();

        if !has_viewport {
            report.issue(
                IssueCategory::Technical,
                IssueSeverity::High,
                "Missing viewport meta tag",
                "The page is not mobile-friendly, which hurts mobile rankings",
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            );
        } else if !has_responsive_markers(html) {
            report.recommend("Consider implementing responsive design for a better mobile experience");
        }

        has_viewport
    }

    fn check_indexability(document: &Html, report: &mut Findings) -> bool {
        let noindex = document.select(&META_SELECTOR).any(|meta| {
            meta.value()
                .attr("content")
                .is_some_and(|c| c.to_lowercase().contains("noindex"))
        });

        if noindex {
            report.recommend("Page is marked as noindex - Ensure this is intentional");
        }

        if meta_content(document, "robots").is_some_and(|c| c.to_lowercase().contains("nofollow")) {
            report.recommend("Page has a nofollow directive - Ensure this is intentional");
        }

        !noindex
    }

    fn check_open_graph(document: &Html, report: &mut Findings) -> OpenGraph {
        let open_graph = OpenGraph {
            has_title: meta_content(document, "og:title").is_some(),
            has_description: meta_content(document, "og:description").is_some(),
            has_image: meta_content(document, "og:image").is_some(),
        };

        if !open_graph.is_complete() {
            report.issue(
                IssueCategory::Social,
                IssueSeverity::Medium,
                "Incomplete Open Graph tags",
                "Shared links render without a proper title, description or image",
                "Add og:title, og:description and og:image meta tags",
            );
        }

        open_graph
    }

    fn check_twitter_card(document: &Html, report: &mut Findings) -> TwitterCard {
        let card_type = meta_content(document, "twitter:card").map(|c| c.trim().to_string());

        if card_type.is_none() {
            report.issue(
                IssueCategory::Social,
                IssueSeverity::Low,
                "Missing Twitter Card tags",
                "Links shared on Twitter/X show a plain preview",
                "Add a twitter:card meta tag (e.g. summary_large_image)",
            );
        }

        TwitterCard {
            present: card_type.is_some(),
            card_type: card_type.filter(|t| !t.is_empty()),
        }
    }

    fn check_structured_data(document: &Html, report: &mut Findings) -> bool {
        let json_ld = document
            .select(&SCRIPT_TYPE_SELECTOR)
            .any(|s| attr_eq(&s, "type", "application/ld+json"));
        let microdata = document.select(&MICRODATA_SELECTOR).next().is_some();
        let present = json_ld || microdata;

        if !present {
            report.issue(
                IssueCategory::Technical,
                IssueSeverity::Medium,
                "No structured data found",
                "The page is not eligible for rich search results",
                "Add structured data (JSON-LD) describing the page content",
            );
        }

        present
    }

    fn check_language(document: &Html, report: &mut Findings) -> Option<String> {
        let language = document
            .select(&HTML_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("lang"))
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty());

        if language.is_none() {
            report.issue(
                IssueCategory::Technical,
                IssueSeverity::Low,
                "Missing language attribute",
                "Search engines and screen readers must guess the page language",
                "Add a lang attribute to the <html> tag",
            );
        }

        language
    }

    fn check_favicon(document: &Html, report: &mut Findings) -> bool {
        let present = link_rel_count(document, "icon") > 0;

        if !present {
            report.issue(
                IssueCategory::Technical,
                IssueSeverity::Low,
                "Missing favicon",
                "Browser tabs, bookmarks and some search results show a generic icon",
                "Add a <link rel=\"icon\"> tag",
            );
        }

        present
    }

    fn check_compression(headers: &HeaderMap, report: &mut Findings) -> bool {
        let compressed = headers
            .get_all(CONTENT_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|encoding| {
                matches!(
                    encoding.trim().to_ascii_lowercase().as_str(),
                    "gzip" | "br" | "deflate"
                )
            });

        if !compressed {
            report.issue(
                IssueCategory::Performance,
                IssueSeverity::Medium,
                "No response compression",
                "Uncompressed HTML increases transfer size and load time",
                "Enable gzip or Brotli compression on the server",
            );
        }

        compressed
    }
}

/// Accumulates issues and recommendations while checks run
#[derive(Default)]
struct Findings {
    issues: Vec<SeoIssue>,
    notes: Vec<String>,
    recommendations: Vec<String>,
}

impl Findings {
    fn issue(
        &mut self,
        category: IssueCategory,
        severity: IssueSeverity,
        issue: impl Into<String>,
        impact: &str,
        solution: &str,
    ) {
        self.issues.push(SeoIssue {
            category,
            severity,
            issue: issue.into(),
            impact: impact.to_string(),
            solution: solution.to_string(),
        });
    }

    /// An issue that is listed but not scored
    fn note(&mut self, issue: &str, recommendation: &str) {
        self.notes.push(issue.to_string());
        self.recommendations.push(recommendation.to_string());
    }

    fn recommend(&mut self, recommendation: &str) {
        self.recommendations.push(recommendation.to_string());
    }

    fn finish(mut self, mut analysis: SeoAnalysis) -> SeoAnalysis {
        // Stable, so checks keep their order within a severity
        self.issues.sort_by_key(|i| i.severity);

        analysis.score = Some(SeoAnalyzer::score(&self.issues));
        analysis.issues = self
            .issues
            .iter()
            .map(|i| i.issue.clone())
            .chain(self.notes)
            .collect();
        analysis.recommendations = self
            .issues
            .iter()
            .map(|i| i.solution.clone())
            .chain(self.recommendations)
            .collect();
        analysis.enhanced_issues = self.issues;
        analysis
    }
}

/// Content of the first `<meta>` whose `name` or `property` matches `key`
fn meta_content<'a>(document: &'a Html, key: &str) -> Option<&'a str> {
    document
        .select(&META_SELECTOR)
        .find(|meta| attr_eq(meta, "name", key) || attr_eq(meta, "property", key))
        .map(|meta| meta.value().attr("content").unwrap_or(""))
}

/// Number of `<link>` elements whose `rel` tokens include `rel`
fn link_rel_count(document: &Html, rel: &str) -> usize {
    document
        .select(&LINK_REL_SELECTOR)
        .filter(|link| {
            link.value()
                .attr("rel")
                .is_some_and(|value| value.split_whitespace().any(|t| t.eq_ignore_ascii_case(rel)))
        })
        .count()
}

fn attr_eq(element: &ElementRef, attr: &str, expected: &str) -> bool {
    element
        .value()
        .attr(attr)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
}

fn max_word_repeats(text: &str) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in text.to_lowercase().split_whitespace() {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    counts.into_values().max().unwrap_or(0)
}

fn has_responsive_markers(html: &str) -> bool {
    let lower = html.to_lowercase();
    ["@media", "media=\"", "media='", "bootstrap", "tailwind", "foundation"]
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_word_repeats() {
        assert_eq!(max_word_repeats("buy shoes buy shoes buy"), 3);
        assert_eq!(max_word_repeats("Rust Rust"), 2);
        assert_eq!(max_word_repeats(""), 0);
    }

    #[test]
    fn test_meta_content_matches_property_and_case() {
        let document = Html::parse_document(
            r#"<html><head>
            <meta NAME="Description" content="Hello">
            <meta property="og:title" content="OG">
            </head></html>"#,
        );
        assert_eq!(meta_content(&document, "description"), Some("Hello"));
        assert_eq!(meta_content(&document, "og:title"), Some("OG"));
        assert_eq!(meta_content(&document, "og:image"), None);
    }

    #[test]
    fn test_link_rel_tokens() {
        let document = Html::parse_document(
            r#"<html><head>
            <link rel="shortcut icon" href="/favicon.ico">
            <link rel="apple-touch-icon" href="/apple.png">
            <link rel="canonical" href="https://example.com/">
            </head></html>"#,
        );
        assert_eq!(link_rel_count(&document, "icon"), 1);
        assert_eq!(link_rel_count(&document, "canonical"), 1);
        assert_eq!(link_rel_count(&document, "stylesheet"), 0);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let issue = SeoIssue {
            category: IssueCategory::Technical,
            severity: IssueSeverity::High,
            issue: "x".to_string(),
            impact: String::new(),
            solution: String::new(),
        };
        let issues = vec![issue; 10];
        assert_eq!(SeoAnalyzer::score(&issues), 0);
        assert_eq!(SeoAnalyzer::score(&[]), 100);
    }
}
