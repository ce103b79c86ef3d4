use crate::models::{IssueSeverity, MonitoringResult, Provenance, WebsiteStatus};
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::io::Write;

pub struct Reporter;

impl Reporter {
    pub fn print_text_report(result: &MonitoringResult) {
        print!("{}", Self::render_text_report(result));
    }

    /// Renders the human-readable report
    pub fn render_text_report(result: &MonitoringResult) -> String {
        let website = &result.website;
        let seo = &result.seo;
        let mut out = String::new();

        out.push_str(&format!("\n{}\n", "=".repeat(80).bright_blue()));
        out.push_str(&format!("{}\n", "Webpulse - Health Report".bright_cyan().bold()));
        out.push_str(&format!("{}\n\n", "=".repeat(80).bright_blue()));

        out.push_str(&format!("{}: {}\n", "URL".bright_white().bold(), website.url));
        out.push_str(&format!(
            "{}: {}\n",
            "Timestamp".bright_white().bold(),
            website.timestamp
        ));
        let status = match website.status {
            WebsiteStatus::Up => "UP".bright_green().bold(),
            WebsiteStatus::Degraded => "DEGRADED".yellow().bold(),
            WebsiteStatus::Down => "DOWN".bright_red().bold(),
        };
        out.push_str(&format!(
            "{}: {} (error rate {}%)\n",
            "Status".bright_white().bold(),
            status,
            website.error_rate
        ));
        out.push_str(&format!(
            "{}: {}\n\n",
            "HTTP".bright_white().bold(),
            website
                .http_status_code
                .map(|code| {
                    if code < 300 {
                        code.to_string().bright_green()
                    } else if code < 400 {
                        code.to_string().yellow()
                    } else {
                        code.to_string().bright_red()
                    }
                })
                .unwrap_or_else(|| "N/A".dimmed())
        ));

        out.push_str(&format!("{}\n", "Timing".bright_yellow().bold().underline()));
        out.push_str(&format!("  Response Time: {}\n", ms(website.response_time)));
        out.push_str(&format!("  TTFB:          {}\n", ms(website.ttfb)));
        out.push_str(&format!("  DNS (est.):    {}\n", ms(website.dns_lookup_time)));
        out.push_str(&format!("  TCP (est.):    {}\n", ms(website.tcp_connect_time)));
        out.push_str(&format!("  TLS (est.):    {}\n", ms(website.tls_handshake_time)));
        if let Some(breakdown) = &website.performance_breakdown {
            out.push_str(&format!("  Download:      {} ms\n", breakdown.download));
        }
        out.push('\n');

        let ssl = &website.ssl_certificate;
        out.push_str(&format!("{}\n", "TLS".bright_yellow().bold().underline()));
        out.push_str(&format!(
            "  HTTPS Reachable: {}\n",
            if ssl.valid {
                "yes".bright_green()
            } else {
                "no".bright_red()
            }
        ));
        if let Some(days) = ssl.days_until_expiry {
            out.push_str(&format!(
                "  Expires In:      {} days {}\n",
                days,
                provenance(ssl.expiry_source)
            ));
        }
        out.push('\n');

        out.push_str(&format!(
            "{} {}\n",
            "Performance".bright_yellow().bold().underline(),
            provenance(website.score_source)
        ));
        out.push_str(&format!("  Performance:    {}\n", score(website.performance_score)));
        out.push_str(&format!("  Mobile:         {}\n", score(website.mobile_score)));
        out.push_str(&format!("  Desktop:        {}\n", score(website.desktop_score)));
        out.push_str(&format!("  Accessibility:  {}\n", score(website.accessibility_score)));
        out.push_str(&format!("  Best Practices: {}\n", score(website.best_practices_score)));
        if let Some(vitals) = &website.core_web_vitals {
            out.push_str(&format!(
                "  Web Vitals:     LCP {} / FID {} / CLS {}\n",
                ms(vitals.lcp),
                ms(vitals.fid),
                vitals
                    .cls
                    .map(|cls| format!("{:.3}", cls))
                    .unwrap_or_else(|| "N/A".to_string())
            ));
        }
        out.push('\n');

        out.push_str(&format!("{}\n", "SEO".bright_yellow().bold().underline()));
        out.push_str(&format!("  Score:     {}\n", score(seo.score)));
        out.push_str(&format!(
            "  Title:     {}\n",
            seo.title_tag.content.as_deref().unwrap_or("N/A").bright_white()
        ));
        out.push_str(&format!(
            "  Headings:  {} H1, {} H2\n",
            seo.headings.h1_count, seo.headings.h2_count
        ));
        out.push_str(&format!(
            "  Images:    {} total, {} missing alt\n",
            seo.images.total, seo.images.missing_alt
        ));
        out.push_str(&format!(
            "  robots.txt: {}  sitemap.xml: {}\n",
            yes_no(seo.robots_txt),
            yes_no(seo.sitemap)
        ));

        if !seo.enhanced_issues.is_empty() {
            out.push_str("  Issues:\n");
            for issue in &seo.enhanced_issues {
                let severity = match issue.severity {
                    IssueSeverity::High => "HIGH".bright_red(),
                    IssueSeverity::Medium => "MED ".yellow(),
                    IssueSeverity::Low => "LOW ".bright_cyan(),
                };
                out.push_str(&format!("    [{}] {}\n", severity, issue.issue));
            }
        } else if !seo.issues.is_empty() {
            out.push_str("  Issues:\n");
            for issue in &seo.issues {
                out.push_str(&format!("    - {}\n", issue));
            }
        }

        out.push_str(&format!("\n{}\n", "=".repeat(80).bright_blue()));
        out
    }

    pub fn save_json_report(result: &MonitoringResult, filename: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        let mut file = File::create(filename)
            .with_context(|| format!("Failed to create report file: {}", filename))?;
        file.write_all(json.as_bytes())?;
        println!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}

fn ms(value: Option<u64>) -> String {
    value
        .map(|v| format!("{} ms", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn score(value: Option<u8>) -> ColoredString {
    match value {
        Some(v) if v >= 90 => v.to_string().bright_green(),
        Some(v) if v >= 50 => v.to_string().yellow(),
        Some(v) => v.to_string().bright_red(),
        None => "N/A".dimmed(),
    }
}

fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".bright_green()
    } else {
        "no".bright_red()
    }
}

fn provenance(source: Provenance) -> ColoredString {
    match source {
        Provenance::Measured => "(measured)".bright_green(),
        Provenance::Estimated => "(estimated)".yellow(),
        Provenance::Unavailable => "(unavailable)".dimmed(),
    }
}
