//! # Symmetria CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server (`POST /command`)
//! - `bridge` - Run the command protocol over stdin/stdout or a request file
//! - `levels` - List the level catalog
//! - `verify` - Check every level's declared automorphism count by enumeration
//! - `check` - Validate a single level file

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use symmetria_core::SymmetriaError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Symmetria - crystal-graph symmetry puzzle engine
///
/// Players discover the automorphisms of small colored graphs. This binary
/// exposes the engine to external drivers over a JSON command protocol.
#[derive(Parser, Debug)]
#[command(name = "symmetria")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: symmetria.toml when present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of JSON level files merged over the built-in levels
    #[arg(short = 'L', long, global = true)]
    pub levels_dir: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the command protocol over a line channel
    Bridge {
        /// Read requests from this file instead of stdin
        #[arg(short, long)]
        requests: Option<PathBuf>,

        /// Append responses to this file instead of stdout
        #[arg(short, long, requires = "requests")]
        output: Option<PathBuf>,

        /// Keep polling the request file for appended lines until `quit`
        #[arg(short, long, requires = "requests")]
        follow: bool,

        /// Poll interval in milliseconds for --follow
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },

    /// List the level catalog
    Levels,

    /// Verify expected automorphism counts by enumeration
    Verify {
        /// Only verify this level
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Validate a level file
    Check {
        /// Path to the level JSON file
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SymmetriaError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.levels_dir {
        config.levels.dir = Some(dir);
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_serve(&config, cli.quiet).await
        }
        Some(Commands::Bridge {
            requests,
            output,
            follow,
            poll_interval_ms,
        }) => {
            if let Some(ms) = poll_interval_ms {
                config.bridge.poll_interval_ms = ms;
            }
            cmd_bridge(&config, requests.as_deref(), output.as_deref(), follow).await
        }
        Some(Commands::Levels) | None => cmd_levels(&config, json_mode),
        Some(Commands::Verify { level }) => cmd_verify(&config, json_mode, level.as_deref()),
        Some(Commands::Check { file }) => cmd_check(&config, json_mode, &file),
    }
}
