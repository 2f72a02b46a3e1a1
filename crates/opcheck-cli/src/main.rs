//! opcheck CLI - inspect the operator catalog, preview the view-copy rewrite,
//! and cross-check abstract execution.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use opcheck_aten::aten_registry;
use opcheck_cli::crossref::{run_crossref, sample_calls};
use opcheck_cli::ops::{list_ops, resolve_ops};
use opcheck_cli::rewrite::rewrite_demo;
use opcheck_core::SchemaRegistry;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "opcheck")]
#[command(about = "View-copy rewriting and abstract-execution cross-checks", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog operators with their tags
    Ops {
        /// Only show operators whose qualified name matches this regex
        #[arg(long, value_name = "REGEX")]
        filter: Option<String>,

        /// Only show view operators
        #[arg(long)]
        views: bool,
    },
    /// Show what the view-copy rewrite turns operators into
    Resolve {
        /// Operator names (e.g. "transpose.int", "aten::t")
        #[arg(value_name = "OP", required = true)]
        ops: Vec<String>,
    },
    /// Print a demo graph before and after the view-copy rewrite
    Rewrite {
        /// Shape of the demo input (must be 2-D)
        #[arg(long, value_delimiter = ',', default_value = "2,3")]
        shape: Vec<usize>,
    },
    /// Run sample calls through the cross-checker
    Crossref {
        /// Skip operators whose qualified name matches this regex
        #[arg(long, value_name = "REGEX")]
        ignore: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ops { filter, views } => cmd_ops(filter.as_deref(), views)?,
        Commands::Resolve { ops } => cmd_resolve(&ops)?,
        Commands::Rewrite { shape } => cmd_rewrite(&shape)?,
        Commands::Crossref { ignore } => cmd_crossref(ignore.as_deref())?,
    }

    Ok(())
}

fn cmd_ops(filter: Option<&str>, views: bool) -> Result<()> {
    let registry = aten_registry().context("Failed to build the aten catalog")?;
    let ops = list_ops(&registry, filter, views)?;

    println!("Found {} operators:", ops.len());
    for entry in ops {
        let name = entry.op.to_string();
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", entry.tags)
        };
        match entry.replacement {
            Some(copy) => println!("  {name:<45} -> {copy}{tags}"),
            None => println!("  {name}{tags}"),
        }
    }
    Ok(())
}

fn cmd_resolve(ops: &[String]) -> Result<()> {
    let registry = aten_registry().context("Failed to build the aten catalog")?;
    for (op, resolved) in resolve_ops(&registry, ops)? {
        if op == resolved {
            println!("{op} (unchanged)");
        } else {
            println!("{op} -> {resolved}");
        }
    }
    Ok(())
}

fn cmd_rewrite(shape: &[usize]) -> Result<()> {
    if shape.len() != 2 {
        anyhow::bail!("The demo input must be 2-D, got shape {:?}", shape);
    }
    let registry: Arc<dyn SchemaRegistry> =
        Arc::new(aten_registry().context("Failed to build the aten catalog")?);
    let report = rewrite_demo(registry, shape)?;

    println!("Before:\n{}", report.before);
    println!("After:\n{}", report.after);
    println!("Example values:");
    for (_, node) in report.after.call_nodes() {
        match &node.meta.val {
            Some(val) => println!("  %{} = {}", node.name, val),
            None => println!("  %{} = (unknown)", node.name),
        }
    }

    if !report.outputs_match {
        anyhow::bail!("Rewritten graph computed different values");
    }
    println!("\n✓ Outputs match");
    Ok(())
}

fn cmd_crossref(ignore: Option<&str>) -> Result<()> {
    let registry = aten_registry().context("Failed to build the aten catalog")?;
    let calls = sample_calls()?;
    let report = run_crossref(&registry, &calls, ignore)?;

    println!("Verified {} calls", report.verified.len());
    for op in &report.verified {
        println!("  ✓ {op}");
    }
    println!("Skipped {} calls", report.skipped.len());
    for (op, reason) in &report.skipped {
        println!("  - {op}: {reason:?}");
    }

    if !report.is_clean() {
        println!("Mismatched {} calls", report.mismatched.len());
        for (op, error) in &report.mismatched {
            println!("  ✗ {op}: {error}");
        }
        anyhow::bail!("{} cross-check failures", report.mismatched.len());
    }
    Ok(())
}
