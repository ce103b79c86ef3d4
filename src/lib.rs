pub mod cli;
pub mod config;
pub mod error;
pub mod estimator;
pub mod fetcher;
pub mod http_client;
pub mod models;
pub mod monitor;
pub mod pagespeed;
pub mod probes;
pub mod reporter;
pub mod seo_analyzer;
pub mod server;
pub mod ssl_inspector;

use anyhow::{Context, Result};
use cli::Cli;
use colored::*;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use monitor::Monitor;
use reporter::Reporter;
use std::time::Duration;

pub async fn run(args: Cli) -> Result<()> {
    let args = match Config::load(&args)? {
        Some(config) => config.merge_with_cli(&args),
        None => args,
    };

    let monitor = Monitor::new(config::monitor_config(&args))?;

    if args.serve {
        println!(
            "{} {}",
            "Webpulse endpoint listening on".bright_cyan().bold(),
            args.listen
        );
        return server::serve(&args.listen, monitor)
            .await
            .with_context(|| format!("Failed to serve on {}", args.listen));
    }

    let url = args
        .url
        .as_deref()
        .context("A URL is required unless --serve is given")?;

    if args.verbose {
        println!("{} {}", "Probing:".bright_white().bold(), url);
        println!(
            "{} {}",
            "PageSpeed:".bright_white().bold(),
            if monitor.uses_pagespeed() {
                "enabled"
            } else {
                "estimated scores"
            }
        );
        println!();
    }

    let spinner = (args.output != "json").then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("[{elapsed_precise}] {spinner:.cyan} {msg}")
                .expect("Progress bar template should be valid"),
        );
        pb.set_message(format!("Probing {}", url));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = monitor.check(url).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = result?;

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        _ => {
            Reporter::print_text_report(&result);
        }
    }

    if let Some(filename) = args.save {
        Reporter::save_json_report(&result, &filename)?;
    }

    Ok(())
}
