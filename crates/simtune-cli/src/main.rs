//! # simtune
//!
//! Command-line entry point: resolves settings, then plans, evaluates, or
//! runs an embedding-similarity fine-tuning job.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simtune_settings::SimtuneSettings;
use simtune_train::{
    EmbeddingService, FitReport, FrozenBackend, HashingEncoder, JobPlan, LocalTrainer,
    TrainingJob,
};

/// Sentence-similarity fine-tuning with a pairwise cosine-embedding loss.
#[derive(Parser, Debug)]
#[command(name = "simtune", about = "Embedding-similarity fine-tuning jobs")]
struct Cli {
    /// Settings file (default: `~/.simtune/settings.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter (overrides settings; `RUST_LOG` wins over both).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved job plan as JSON.
    Plan,
    /// Validation loss of the encoder on a CSV file.
    Eval {
        /// CSV with `label,text` rows.
        #[arg(long)]
        data: String,
    },
    /// Run the training loop with a frozen backend.
    Fit,
}

fn load(cli: &Cli) -> Result<SimtuneSettings> {
    match &cli.config {
        Some(path) => simtune_settings::load_settings_from_explicit_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => simtune_settings::load_settings().context("Failed to load settings"),
    }
}

fn encoder(settings: &SimtuneSettings) -> Arc<dyn EmbeddingService> {
    Arc::new(HashingEncoder::from_backbone(&settings.backbone))
}

fn plan(job: &TrainingJob) -> JobPlan {
    match job.train_loader() {
        Ok(train) => job.plan(Some(&train)),
        Err(e) => {
            tracing::warn!(error = %e, "training data unavailable; plan has no step estimate");
            job.plan(None)
        }
    }
}

async fn eval(job: &TrainingJob, data: &str) -> Result<serde_json::Value> {
    let settings = job.settings();
    let loader = job
        .configure_data(data, settings.data.val_batch_size, false)
        .with_context(|| format!("Failed to load {data}"))?;
    let module = job.configure_module(encoder(settings))?;
    let mut trainer = LocalTrainer::new(job.trainer_config(), FrozenBackend::default());
    let val_loss = trainer.validate(&module, &loader, 0, 0).await?;
    Ok(serde_json::json!({
        "data": data,
        "rows": loader.dataset().len(),
        "valLoss": val_loss,
    }))
}

async fn fit(job: &TrainingJob) -> Result<FitReport> {
    let report = job
        .run(encoder(job.settings()), FrozenBackend::default())
        .await
        .context("Training run failed")?;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load(&cli)?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    simtune_core::logging::init_subscriber(&level);

    let job = TrainingJob::from_settings(settings).context("Invalid job settings")?;
    let output = match &cli.command {
        Command::Plan => serde_json::to_value(plan(&job))?,
        Command::Eval { data } => eval(&job, data).await?,
        Command::Fit => serde_json::to_value(fit(&job).await?)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
