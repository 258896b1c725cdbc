//! sqlmark CLI - find the Java call sites of MyBatis mapper statements.
//!
//! Features:
//! - Statements discovered from mapper XML, or named with `--statement`
//! - Tool class from `--tool-class` or `sqlmark.toml`
//! - Rayon-powered parallel parsing and resolution
//! - Plain text or JSON reports

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;

use sqlmark_core::{
    init_structured_logging, load_config, log_error, log_event, log_info, log_warn, print_json,
    print_plain, ResolveError, Sqlmark, SqlmarkConfig, SqlmarkError, TargetStatement,
    CONFIG_FILE,
};

/// Exit code for configuration problems and internal failures.
const EXIT_CONFIG: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the Java call sites of MyBatis mapper statements")]
pub struct Cli {
    /// Path to the root of the Java project
    #[arg(default_value = ".")]
    path: String,

    /// Fully qualified data-access class, e.g. com.example.DBUtils
    #[arg(long, value_name = "FQN")]
    tool_class: Option<String>,

    /// Statements to resolve as <namespace>.<id>; defaults to every mapper statement
    #[arg(long, value_name = "NS.ID", num_args = 1..)]
    statement: Vec<String>,

    /// Directory names to skip while scanning
    #[arg(long, value_name = "DIR", num_args = 1..)]
    exclude: Vec<String>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,
}

/// Parses `--statement` values, rejecting any without a namespace or id.
fn parse_statements(values: &[String]) -> Result<Vec<TargetStatement>> {
    values
        .iter()
        .map(|value| TargetStatement::parse(value).map_err(anyhow::Error::from))
        .collect()
}

/// The command line wins over the config file; blank values count as absent.
fn effective_tool_class(cli: Option<&str>, config: Option<&SqlmarkConfig>) -> Option<String> {
    cli.map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| config.and_then(SqlmarkConfig::tool_class))
        .map(String::from)
}

fn print_configuration_hint(root: &Path) {
    log_warn("no tool class configured");
    eprintln!("ERROR: no tool class configured.");
    eprintln!("Set the class your DAO code calls with statement names, either:");
    eprintln!("  sqlmark {} --tool-class com.example.DBUtils", root.display());
    eprintln!("or in {}:", root.join(CONFIG_FILE).display());
    eprintln!("  tool_class = \"com.example.DBUtils\"");
}

fn main() -> Result<()> {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] sqlmark internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code {}.", EXIT_CONFIG);
        std::process::exit(EXIT_CONFIG);
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    let root = fs::canonicalize(&cli.path)
        .with_context(|| format!("Failed to resolve project path: {}", cli.path))?;
    let config = load_config(&root)?;
    log_info(&format!("analyzing {}", root.display()));

    let Some(tool_class) = effective_tool_class(cli.tool_class.as_deref(), config.as_ref())
    else {
        print_configuration_hint(&root);
        std::process::exit(EXIT_CONFIG);
    };

    let statements = parse_statements(&cli.statement)?;
    let mut excludes = cli.exclude.clone();
    if let Some(extra) = config.as_ref().and_then(|c| c.exclude.clone()) {
        excludes.extend(extra);
    }

    let result = match Sqlmark::new(&root)
        .tool_class(tool_class)
        .statements(statements)
        .exclude_dirs(excludes)
        .analyze()
    {
        Ok(result) => result,
        Err(SqlmarkError::Resolve(ResolveError::NotConfigured)) => {
            print_configuration_hint(&root);
            std::process::exit(EXIT_CONFIG);
        }
        Err(e) => {
            log_error(&e.to_string());
            return Err(e).context("Analysis failed");
        }
    };
    log_event(
        "analysis_complete",
        &format!(
            "{} statements, {} call sites",
            result.stats.statements, result.stats.call_sites
        ),
    );

    let json = cli.json || config.as_ref().is_some_and(SqlmarkConfig::wants_json);
    if json {
        print_json(&result);
    } else {
        print_plain(&result);
    }

    Ok(())
}
