//! Copysmith CLI - quality-gated marketing content workflows
//!
//! Usage:
//!   copysmith init                      Write a default copysmith.toml
//!   copysmith run --platform <p> <topic>  Run the full content workflow
//!   copysmith check <file>              Deterministic validation only
//!   copysmith status                    Show circuit-breaker states

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use copysmith_agent::AnthropicClient;
use copysmith_core::{Brief, CopysmithConfig, Model, Platform};
use copysmith_orchestrator::{BreakerRegistry, JsonlStore, NullStore, RevisionLoop};
use copysmith_validation::HybridValidator;

#[derive(Parser)]
#[command(name = "copysmith")]
#[command(author, version, about = "Quality-gated marketing content workflows")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default copysmith.toml to the current directory
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Run the full write-validate-revise workflow
    Run {
        /// Topic to write about
        topic: String,

        /// Content platform
        #[arg(short, long, default_value = "linkedin")]
        platform: Platform,

        /// Intended audience
        #[arg(short, long)]
        audience: Option<String>,

        /// Research notes the writer may draw on (file path or inline text)
        #[arg(short, long)]
        notes: Option<String>,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<Model>,

        /// Append the workflow result to this JSONL file
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,
    },

    /// Run deterministic validation over an existing draft file
    Check {
        /// Draft file to validate
        file: PathBuf,

        /// Content platform
        #[arg(short, long, default_value = "linkedin")]
        platform: Platform,
    },

    /// Show the configured circuit breakers and their states
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => cmd_init(&path),
        Commands::Run {
            topic,
            platform,
            audience,
            notes,
            model,
            record,
        } => cmd_run(topic, platform, audience, notes, model, record).await,
        Commands::Check { file, platform } => cmd_check(&file, platform),
        Commands::Status => cmd_status(),
    }
}

fn cmd_init(path: &Path) -> Result<()> {
    CopysmithConfig::write_default(path).context("Failed to write default config")?;
    println!("Wrote {}", path.join("copysmith.toml").display());
    Ok(())
}

async fn cmd_run(
    topic: String,
    platform: Platform,
    audience: Option<String>,
    notes: Option<String>,
    model: Option<Model>,
    record: Option<PathBuf>,
) -> Result<()> {
    let config = CopysmithConfig::load_or_default(Path::new("."))?;
    let model = match model {
        Some(m) => m,
        None => config.models.default.parse().map_err(anyhow::Error::msg)?,
    };

    let client = AnthropicClient::from_env(&config.models.api_key_env, model)?;
    let breakers = BreakerRegistry::from_config(&config.breaker);
    let validator = HybridValidator::new(config.validation.clone());
    let store: Arc<dyn copysmith_orchestrator::ExecutionStore> = match record {
        Some(path) => Arc::new(JsonlStore::new(path)),
        None => Arc::new(NullStore),
    };

    let workflow = RevisionLoop::new(
        Arc::new(client),
        breakers,
        validator,
        store,
        config.workflow.clone(),
        config.tools.clone(),
    );

    let mut brief = Brief::new(platform, topic);
    brief.audience = audience;
    brief.notes = match notes {
        // A path argument points at a notes file; anything else is inline
        Some(n) if Path::new(&n).is_file() => Some(std::fs::read_to_string(&n)?),
        other => other,
    };

    let result = workflow.run(&brief).await?;

    println!("{}", result.draft);
    println!();
    println!(
        "Score: {}/100 after {} revision(s){}",
        result.grading.score,
        result.iterations,
        if result.met_target(config.workflow.target_score) {
            ""
        } else {
            "  [below target, flag for review]"
        }
    );
    if !result.grading.feedback.is_empty() {
        println!("Feedback: {}", result.grading.feedback);
    }
    println!(
        "Tokens: {} in / {} out",
        result.total_usage.input_tokens, result.total_usage.output_tokens
    );
    Ok(())
}

fn cmd_check(file: &Path, platform: Platform) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let config = CopysmithConfig::load_or_default(Path::new("."))?;
    let validator = HybridValidator::new(config.validation);

    let issues = validator.validate(&content, platform);
    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    println!("{} issue(s):", issues.len());
    for issue in &issues {
        print!("  [{}] {}: {}", issue.severity, issue.code, issue.message);
        if let Some(hint) = &issue.fix_hint {
            print!("  ({})", hint);
        }
        println!();
    }
    std::process::exit(1);
}

fn cmd_status() -> Result<()> {
    let config = CopysmithConfig::load_or_default(Path::new("."))?;
    let registry = BreakerRegistry::from_config(&config.breaker);

    // Breakers are per-process, so a fresh invocation always shows the
    // configured baseline rather than live failure counts.
    for (name, snapshot) in registry.snapshots() {
        println!(
            "{:<20} {:<10} failures {}/{}  recovery {}s",
            name,
            snapshot.state,
            snapshot.failure_count,
            snapshot.failure_threshold,
            snapshot.recovery_timeout.as_secs()
        );
    }
    Ok(())
}
