//! persona-engine - command-line entry point
//!
//! Reads a fetched profile document, runs the analysis pipeline and writes
//! the persona record as JSON.

mod cli;
mod version;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use persona_engine::config::{self, EngineConfig, LoggingSettings};
use persona_engine::error::{Error, Result};
use persona_engine::logging::{self, LogGuards};
use persona_engine::{ingest, rules, ContentStore, PersonaPipeline, PersonaRecord};

use crate::cli::{AnalyzeArgs, Cli, Commands, ConfigSubcommand, RulesSubcommand};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => {
            let _log_guards = init_minimal_logging(cli.verbose, cli.quiet)?;
            handle_config_command(subcommand)
        }
        Commands::Rules { subcommand } => {
            let _log_guards = init_minimal_logging(cli.verbose, cli.quiet)?;
            handle_rules_command(subcommand)
        }
        Commands::Analyze(args) => {
            let config = load_analyze_config(&args)?;

            // The guards must be kept alive for the lifetime of the program
            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

            let build = version::BuildInfo::current();
            debug!(version = %build.full_version(), target = %build.target, "Starting persona-engine");

            run_analyze(&args, &config)
        }
    }
}

/// Console-only logging for management commands
fn init_minimal_logging(verbose: u8, quiet: bool) -> Result<LogGuards> {
    logging::init_logging(&LoggingSettings::default(), verbose, quiet)
}

/// Load configuration and apply `analyze` flags on top
fn load_analyze_config(args: &AnalyzeArgs) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(args.config.as_deref())?;

    if let Some(ref rules) = args.rules {
        config.rules.path = Some(rules.clone());
    }
    if let Some(limit) = args.posts_limit {
        config.input.posts_limit = limit;
    }
    if let Some(limit) = args.comments_limit {
        config.input.comments_limit = limit;
    }
    if args.parallel {
        config.analysis.parallel = true;
    }
    if args.compact {
        config.output.pretty = false;
    }

    config.validate()?;
    Ok(config)
}

fn run_analyze(args: &AnalyzeArgs, config: &EngineConfig) -> Result<()> {
    // Rule table is loaded once for the process
    rules::install(rules::resolve(config.rules.path.as_deref())?)?;

    let ingested = ingest::load_document(&args.input, &config.input)?;
    let subject = args.subject.clone().or(ingested.subject);
    let store = ContentStore::load(ingested.items)?;

    let pipeline = PersonaPipeline::from_global(config.analysis.clone())?;
    let record = if config.analysis.parallel {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("persona-engine")
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;
        runtime.block_on(pipeline.run_parallel(Arc::new(store), subject.as_deref()))?
    } else {
        pipeline.run(&store, subject.as_deref())?
    };

    let mut json = if config.output.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    json.push('\n');

    match args.output {
        Some(ref output) => {
            let path = Path::new(output);
            fs::write(path, &json).map_err(|e| Error::IoWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
            info!(path = %path.display(), "Persona written");
            print_summary(&record, path)?;
        }
        None => print!("{}", json),
    }

    Ok(())
}

/// Short human-readable report after writing to a file
fn print_summary(record: &PersonaRecord, path: &Path) -> Result<()> {
    println!("Persona written to {}", path.display());
    if let Some(ref subject) = record.subject {
        println!("  Subject:     {}", subject);
    }
    println!(
        "  Analyzed:    {} items ({} posts, {} comments)",
        record.summary.items_analyzed, record.summary.posts, record.summary.comments
    );
    println!("  Claims:      {}", record.all_claims().count());
    println!("  Scales:      {}", record.scales.len());
    println!("  Confidence:  {}", record.confidence.level);
    println!("  Fingerprint: {}", record.fingerprint()?);
    Ok(())
}

/// Handle rule table subcommands
fn handle_rules_command(subcommand: RulesSubcommand) -> Result<()> {
    match subcommand {
        RulesSubcommand::Show { rules: None } => {
            print!("{}", rules::bundled_source());
        }
        RulesSubcommand::Show { rules: Some(path) } => {
            let table = rules::resolve(Some(path.as_str()))?;
            println!("{}", toml::to_string_pretty(&table)?);
        }
        RulesSubcommand::Validate { rules } => {
            let table = rules::resolve(Some(rules.as_str()))?;
            println!(
                "Rule table is valid: {} labels, {} axes, {} behavior patterns.",
                table.labels.len(),
                table.axes.len(),
                table.behavior.windows.len() + table.behavior.cadence.len()
            );
        }
        RulesSubcommand::Init { path, force } => {
            let path = shellexpand::tilde(&path).into_owned();
            rules::init_rules(Path::new(&path), force)?;
            println!("Rule table created: {}", path);
        }
    }
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = EngineConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            EngineConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
