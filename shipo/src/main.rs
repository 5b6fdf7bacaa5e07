//! shipo - Post a short message to Bluesky and/or Twitter

use clap::Parser;
use libshipo::config::Config;
use libshipo::dispatcher;
use libshipo::{PlatformSelector, PostResult, ReqwestTransport, Result, ShipoError};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "shipo", version)]
#[command(about = "Post a short message to Bluesky and Twitter", long_about = None)]
struct Cli {
    /// Content of the post (required)
    #[arg(short, long)]
    content: Option<String>,

    /// Platforms to post to: 'b' for Bluesky, 't' for Twitter, 'bt' for both
    #[arg(short, long, default_value = PlatformSelector::DEFAULT)]
    platform: String,

    /// Config file (defaults to ~/.config/shipo-cli/config)
    #[arg(long, env = "SHIPO_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libshipo::logging::init_from_env(cli.verbose);

    // Run the main logic and handle errors
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let content = cli.content.unwrap_or_default();
    if content.is_empty() {
        return Err(ShipoError::InvalidInput("--content is required".to_string()));
    }

    let format = OutputFormat::parse(&cli.format)?;

    let config = Config::load_from(cli.config.as_deref())?;

    let transport = Arc::new(ReqwestTransport::new());

    // Text results are printed as each platform succeeds, so an earlier post
    // is still reported when a later platform fails.
    let mut reported = Vec::new();
    let outcome = dispatcher::run_with(&content, &cli.platform, &config, transport, |result| {
        if format == OutputFormat::Text {
            print_text_result(result);
        }
        reported.push(result.clone());
    })
    .await;

    if format == OutputFormat::Json && (outcome.is_ok() || !reported.is_empty()) {
        print_json_results(&reported);
    }

    outcome.map(|_| ())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(format: &str) -> Result<Self> {
        match format {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ShipoError::InvalidInput(format!(
                "Invalid format '{}'. Valid options: text, json",
                other
            ))),
        }
    }
}

fn print_text_result(result: &PostResult) {
    if result.post_id.is_empty() {
        println!("{}: Post successful!", result.platform);
    } else {
        println!("{}: Post successful! ({})", result.platform, result.post_id);
    }
}

fn print_json_results(results: &[PostResult]) {
    match serde_json::to_string_pretty(results) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to encode results: {}", e),
    }
}
