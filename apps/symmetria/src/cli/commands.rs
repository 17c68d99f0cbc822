//! # CLI Command Implementations

use crate::api;
use crate::bridge::CommandBridge;
use crate::bridge::transport::{self, ChannelSummary};
use crate::config::Config;
use crate::levels;
use std::path::Path;
use symmetria_core::{
    LevelCatalog, LevelId, LevelSession, LevelVerification, SymmetriaError, level_fingerprint,
    verify_level,
};

fn load_catalog(config: &Config) -> Result<LevelCatalog, SymmetriaError> {
    levels::load_catalog(&config.levels)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(config: &Config, quiet: bool) -> Result<(), SymmetriaError> {
    let catalog = load_catalog(config)?;
    let level_count = catalog.len();
    let bridge = CommandBridge::new(LevelSession::new(catalog));

    if !quiet {
        print_banner();
        println!("Configuration:");
        println!("  Address:    {}", config.server.addr());
        println!("  Levels:     {}", level_count);
        println!(
            "  Rate limit: {}",
            match config.server.rate_limit {
                0 => "disabled".to_string(),
                rps => format!("{} requests/second", rps),
            }
        );
        println!();
        println!("Endpoints:");
        println!("  POST /command - Execute a protocol command");
        println!("  GET  /health  - Health check");
        println!();
        println!("Send {{\"cmd\": \"quit\"}} or press Ctrl+C to stop");
        println!();
    }

    api::run_server(&config.server, bridge).await
}

/// Print the Symmetria startup banner.
fn print_banner() {
    println!(
        r#"
   ◆───◆
   │ ╲ │    Symmetria v{}
   ◆───◆    crystal-graph symmetry engine
"#,
        env!("CARGO_PKG_VERSION")
    );
}

// =============================================================================
// BRIDGE COMMAND
// =============================================================================

/// Run the line-oriented command channel.
///
/// Stdout carries protocol records only; diagnostics go to the log on
/// stderr.
pub async fn cmd_bridge(
    config: &Config,
    requests: Option<&Path>,
    output: Option<&Path>,
    follow: bool,
) -> Result<(), SymmetriaError> {
    let catalog = load_catalog(config)?;
    let mut bridge = CommandBridge::new(LevelSession::new(catalog));

    let summary: ChannelSummary = match requests {
        Some(path) => {
            let follow = follow.then(|| config.bridge.poll_interval());
            transport::run_file(&mut bridge, path, output, follow).await?
        }
        None => transport::run_stdio(&mut bridge).await?,
    };

    tracing::info!(
        handled = summary.handled,
        terminated = summary.terminated,
        "bridge finished"
    );
    Ok(())
}

// =============================================================================
// LEVELS COMMAND
// =============================================================================

/// List the catalog.
pub fn cmd_levels(config: &Config, json_mode: bool) -> Result<(), SymmetriaError> {
    let catalog = load_catalog(config)?;

    if json_mode {
        let levels = catalog
            .iter()
            .map(|level| {
                Ok(serde_json::json!({
                    "level_id": level.level_id(),
                    "title": level.title(),
                    "act": level.act(),
                    "group_name": level.group_name(),
                    "crystals": level.crystal_count(),
                    "edges": level.edge_count(),
                    "expected_automorphism_count": level.expected_automorphism_count(),
                    "requires_subgroup": level.requires_subgroup(),
                    "fingerprint": level_fingerprint(level)?,
                }))
            })
            .collect::<Result<Vec<serde_json::Value>, SymmetriaError>>()?;
        print_json(&serde_json::json!({ "levels": levels }));
        return Ok(());
    }

    println!("Symmetria Levels");
    println!("================");
    for level in catalog.iter() {
        println!(
            "{:<16} act {}  {:<8} |G|={:<3} {:>2} crystals{}  {}",
            level.level_id(),
            level.act(),
            level.group_name(),
            level.expected_automorphism_count(),
            level.crystal_count(),
            if level.requires_subgroup() {
                "  +subgroup"
            } else {
                ""
            },
            level.title()
        );
    }
    println!();
    println!("{} levels", catalog.len());
    Ok(())
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

/// Enumerate automorphisms of every level (or one) and compare with the
/// declared count. Fails if any level is inconsistent.
pub fn cmd_verify(
    config: &Config,
    json_mode: bool,
    only: Option<&str>,
) -> Result<(), SymmetriaError> {
    let catalog = load_catalog(config)?;

    let graphs = match only {
        Some(id) => vec![catalog.get(&LevelId::new(id))?],
        None => catalog.iter().cloned().collect(),
    };

    let mut results: Vec<LevelVerification> = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        results.push(verify_level(graph)?);
    }
    let failures = results.iter().filter(|r| !r.is_consistent()).count();

    if json_mode {
        print_json(&serde_json::json!({
            "levels": results,
            "failures": failures,
        }));
    } else {
        for result in &results {
            println!(
                "{:<16} expected {:>3}  found {:>3}  {}",
                result.level_id,
                result.expected,
                result.actual,
                if result.is_consistent() { "ok" } else { "MISMATCH" }
            );
        }
        println!();
        println!("{} verified, {} mismatched", results.len(), failures);
    }

    match results.iter().find(|r| !r.is_consistent()) {
        None => Ok(()),
        Some(bad) => Err(SymmetriaError::InvalidLevel {
            level: LevelId::new(bad.level_id.clone()),
            reason: format!(
                "declares {} automorphisms, enumeration found {}",
                bad.expected, bad.actual
            ),
        }),
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate one level file: parse, build, and verify its automorphism count.
pub fn cmd_check(config: &Config, json_mode: bool, file: &Path) -> Result<(), SymmetriaError> {
    let definition = levels::read_level_file(file, config.levels.max_file_bytes)?;
    let graph = definition.to_model()?;
    let verification = verify_level(&graph)?;
    let fingerprint = level_fingerprint(&graph)?;

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.display().to_string(),
            "verification": verification,
            "fingerprint": fingerprint,
        }));
    } else {
        println!("Level:       {}", graph.level_id());
        println!("Title:       {}", graph.title());
        println!("Crystals:    {}", graph.crystal_count());
        println!("Edges:       {}", graph.edge_count());
        println!(
            "Symmetries:  {} declared, {} found",
            verification.expected, verification.actual
        );
        println!("Fingerprint: {}", fingerprint);
    }

    if verification.is_consistent() {
        Ok(())
    } else {
        Err(SymmetriaError::InvalidLevel {
            level: graph.level_id().clone(),
            reason: format!(
                "declares {} automorphisms, enumeration found {}",
                verification.expected, verification.actual
            ),
        })
    }
}
