//! Gulf Tracker CLI

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};

use gulf_tracker::{
    analysis::{history, is_correct},
    config::{Config, ProviderConfig},
    logging,
    reporting::{failure_report, print_console_report, print_history_report, CsvLog, RunSummary},
    results::RunReport,
    runner::{slots_from_config, ConsoleProgress, Generator, GeneratorConfig},
};

#[derive(Parser)]
#[command(name = "gulf-tracker")]
#[command(about = "Track what LLM providers call the gulf between the USA and Mexico")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask every enabled provider and append the verdicts to the CSV logs
    Run {
        /// Comma-separated provider ids (default: all enabled)
        #[arg(short, long)]
        providers: Option<String>,

        /// Directory holding the per-provider CSV logs
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Ask and grade, but don't write the logs
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON run summary to this path
        #[arg(short, long)]
        summary: Option<PathBuf>,
    },

    /// Call each enabled provider once and report failures
    Smoke {
        /// Comma-separated provider ids (default: all enabled)
        #[arg(short, long)]
        providers: Option<String>,
    },

    /// Grade a single answer
    Evaluate {
        /// Answer text to grade
        answer: String,
    },

    /// Show logged history per provider
    History {
        /// Directory holding the per-provider CSV logs
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// List enabled and archived providers
    ListProviders,

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/gulf-tracker.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // InitConfig writes defaults and must work even when the existing file is broken
    let config = match (&cli.command, &cli.config) {
        (Commands::InitConfig { .. }, _) => Config::default(),
        (_, Some(path)) => Config::from_file(path)?,
        (_, None) => Config::load_or_default()?,
    };

    if let Err(e) = logging::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Run {
            providers,
            data_dir,
            dry_run,
            summary,
        } => {
            run(&config, providers, data_dir, dry_run, summary).await?;
        }

        Commands::Smoke { providers } => {
            smoke(&config, providers).await?;
        }

        Commands::Evaluate { answer } => {
            println!("{}", is_correct(&answer));
        }

        Commands::History { data_dir } => {
            show_history(&config, data_dir)?;
        }

        Commands::ListProviders => {
            list_providers(&config);
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn select(
    config: &Config,
    providers_arg: Option<String>,
) -> Result<Vec<ProviderConfig>, Box<dyn std::error::Error>> {
    let selected = match providers_arg {
        Some(names) => {
            let names: Vec<&str> = names
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            config.select_providers(&names)?
        }
        None => config.enabled_providers().to_vec(),
    };

    if selected.is_empty() {
        return Err("No providers enabled. Add [[providers]] entries to the configuration.".into());
    }

    Ok(selected)
}

async fn generate(config: &Config, providers: &[ProviderConfig]) -> RunReport {
    let ids: Vec<&str> = providers.iter().map(|p| p.id.as_str()).collect();
    println!("Providers: {}", ids.join(", "));
    println!("Question: {}", config.run.question);

    let slots = slots_from_config(providers, &config.run);
    let generator = Generator::new(GeneratorConfig::from(&config.run)).with_progress(ConsoleProgress);
    generator.run(&slots).await
}

async fn run(
    config: &Config,
    providers_arg: Option<String>,
    data_dir: Option<PathBuf>,
    dry_run: bool,
    summary_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Gulf Tracker ===");
    let providers = select(config, providers_arg)?;
    let report = generate(config, &providers).await;

    let stats = if dry_run {
        println!("\nDry run: CSV logs left untouched");
        None
    } else {
        let log = CsvLog::new(data_dir.unwrap_or_else(|| config.output.data_dir.clone()));
        Some(log.update(&report)?)
    };

    let summary = RunSummary::from_report(&report, stats.as_ref());
    print_console_report(&summary);

    if let Some(path) = summary_path {
        ensure_parent(&path)?;
        summary.write_to_file(&path)?;
        println!("\nJSON summary written to: {}", path.display());
    }

    println!("\nTL;DR: {}", summary.tldr());

    if !summary.log_errors.is_empty() {
        return Err(format!("{} CSV logs could not be updated", summary.log_errors.len()).into());
    }
    Ok(())
}

async fn smoke(config: &Config, providers_arg: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Provider Smoke Test ===");
    let providers = select(config, providers_arg)?;
    let report = generate(config, &providers).await;

    match failure_report(&report) {
        Some(text) => {
            eprintln!("\n{}", text);
            std::process::exit(1);
        }
        None => {
            println!("\nAll {} providers answered.", report.outcomes.len());
            Ok(())
        }
    }
}

fn show_history(config: &Config, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let log = CsvLog::new(data_dir.unwrap_or_else(|| config.output.data_dir.clone()));

    // Configured providers first, then any other logs found on disk
    let mut ids: Vec<String> = config
        .providers
        .iter()
        .chain(&config.archived)
        .map(|p| p.id.clone())
        .collect();
    for id in log.providers()? {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let histories = history::load_all(&log, &ids)?;
    print_history_report(&histories, Local::now().date_naive());
    Ok(())
}

fn list_providers(config: &Config) {
    println!("Enabled providers ({}):", config.providers.len());
    println!("{:-<60}", "");
    for p in &config.providers {
        println!("  {:<12} | {:<9} | {:<28} | {}", p.id, p.kind.as_str(), p.model, p.api_key_env);
    }

    if !config.archived.is_empty() {
        println!("\nArchived providers ({}):", config.archived.len());
        println!("{:-<60}", "");
        for p in &config.archived {
            println!("  {:<12} | {:<9} | {:<28} | {}", p.id, p.kind.as_str(), p.model, p.api_key_env);
        }
    }
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    ensure_parent(&output)?;
    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
