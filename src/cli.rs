use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "webpulse")]
#[command(about = "A website health probe: uptime, latency, TLS, PageSpeed and SEO", long_about = None)]
pub struct Cli {
    /// The URL to probe (https:// is assumed when no scheme is given)
    #[arg(value_name = "URL", required_unless_present = "serve")]
    pub url: Option<String>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub output: String,

    /// Save the JSON result to a file
    #[arg(short, long)]
    pub save: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Serve the monitoring endpoint over HTTP instead of probing once
    #[arg(long)]
    pub serve: bool,

    /// Address the monitoring endpoint listens on
    #[arg(long, default_value = "127.0.0.1:8787")]
    pub listen: String,

    /// Timeout in seconds for the page fetch and each HEAD probe (default: 20)
    #[arg(short, long, default_value_t = 20)]
    pub timeout: u64,

    /// Deadline in seconds for the whole probe (default: 45)
    #[arg(long, default_value_t = 45)]
    pub deadline: u64,

    /// PageSpeed Insights API key; estimated scores are used without one
    #[arg(long, env = "PAGESPEED_API_KEY", hide_env_values = true)]
    pub pagespeed_key: Option<String>,

    /// PageSpeed Insights endpoint
    #[arg(long, default_value = crate::pagespeed::DEFAULT_ENDPOINT)]
    pub pagespeed_endpoint: String,

    /// Timeout in seconds for PageSpeed requests (default: 30)
    #[arg(long, default_value_t = 30)]
    pub pagespeed_timeout: u64,

    /// Also request the SEO category from PageSpeed
    #[arg(long)]
    pub pagespeed_seo: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long)]
    pub config: Option<String>,
}
