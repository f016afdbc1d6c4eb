//! # ldpstore - LDP Resource Repository
//!
//! The command-line binary over the ldpstore-core resource engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │             apps/ldpstore (THE BINARY)           │
//! │                                                  │
//! │  ┌─────────────┐    ┌──────────────────────┐     │
//! │  │    CLI      │    │  Config (TOML + env) │     │
//! │  │   (clap)    │    │                      │     │
//! │  └──────┬──────┘    └──────────┬───────────┘     │
//! │         └───────────┬──────────┘                 │
//! │                     ▼                            │
//! │             ┌───────────────┐                    │
//! │             │ ldpstore-core │                    │
//! │             │  (THE LOGIC)  │                    │
//! │             └───────────────┘                    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! ldpstore init
//! echo '<> <http://purl.org/dc/terms/title> "Hello" .' | ldpstore put /hello
//! ldpstore get /hello --all
//! ldpstore version /hello --label v1
//! ldpstore delete /hello
//! ```

use clap::Parser;
use ldpstore::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // LDPSTORE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LDPSTORE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "ldpstore=debug,ldpstore_core=debug"
    } else {
        "ldpstore=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
