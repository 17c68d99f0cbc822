//! # Symmetria
//!
//! Entry point of the `symmetria` binary.
//!
//! ## Usage
//!
//! ```bash
//! # Serve the command protocol over HTTP
//! symmetria serve --host 0.0.0.0 --port 8080
//!
//! # Serve it over stdin/stdout
//! symmetria bridge
//!
//! # Drive it through an append-only request file
//! symmetria bridge --requests requests.jsonl --output responses.jsonl --follow
//!
//! # Catalog tooling
//! symmetria levels
//! symmetria verify
//! symmetria check my_level.json
//! ```

use clap::Parser;
use symmetria::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // SYMMETRIA_LOG_FORMAT=json enables machine-parseable output. Logs go to
    // stderr; stdout belongs to the protocol in bridge mode.
    let log_format = std::env::var("SYMMETRIA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "symmetria=debug,tower_http=debug"
    } else {
        "symmetria=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
