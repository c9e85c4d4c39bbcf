//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `media_gateway` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All validation logic is implemented in the library crate.

use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use media_gateway::config::{GatewayConfig, Opt};
use media_gateway::initialization::init_logger_with;
use media_gateway::UrlGateway;

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = GatewayConfig {
        site_url: opt.site_url.clone().unwrap_or_default(),
        uploads_url: opt.uploads_url.clone().unwrap_or_default(),
        extra_trusted_domains: opt.trusted.clone(),
        dns_timeout: Duration::from_secs(opt.dns_timeout_seconds),
        ..GatewayConfig::default()
    };

    let gateway = UrlGateway::from_config(config).context("Failed to initialize gateway")?;

    let mut rejected = 0usize;
    for url in &opt.urls {
        if gateway.validate_file_url(url).await {
            println!("VALID   {url}");
        } else {
            rejected += 1;
            println!("INVALID {url}");
        }
    }

    if rejected > 0 {
        eprintln!(
            "{} of {} URL{} rejected",
            rejected,
            opt.urls.len(),
            if opt.urls.len() == 1 { "" } else { "s" }
        );
        process::exit(1);
    }

    Ok(())
}
