//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `uas_parser` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use std::process;
use structopt::StructOpt;

use uas_parser::initialization::init_logger_with;
use uas_parser::{ClassificationResult, Opt, RefreshOutcome, UasParser};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let parser = match UasParser::new(opt.to_config()) {
        Ok(parser) => parser,
        Err(e) => {
            eprintln!("uas_parser error: {:#}", e);
            process::exit(1);
        }
    };

    if opt.clear_cache && !parser.clear_cache().await {
        log::warn!("Cache could not be fully cleared");
    }
    if opt.force_update {
        let outcome = parser.try_download_data(true).await;
        if let RefreshOutcome::Failed { error, .. } = &outcome {
            log::warn!("Forced update failed: {}", error);
        }
    }

    let user_agents: Vec<Option<&str>> = if opt.user_agents.is_empty() {
        vec![None]
    } else {
        opt.user_agents.iter().map(|ua| Some(ua.as_str())).collect()
    };

    for user_agent in user_agents {
        let result = parser.classify(user_agent).await;
        if opt.json {
            println!(
                "{}",
                serde_json::to_string(&result).context("Failed to serialize result")?
            );
        } else {
            println!("{}", summary(&result));
        }
    }
    Ok(())
}

fn summary(result: &ClassificationResult) -> String {
    format!(
        "{} - {} run on {} --> {}",
        result.kind, result.ua_name, result.os_name, result.ua_info_url
    )
}
