use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use chrono::Utc;
use flowguard::{evaluate, generate_mock_dataset, predict, AppContext, Config, Dataset, PredictionSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct BenchArgs {
    #[command(subcommand)]
    pub command: BenchCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum BenchCommand {
    /// Write a labelled dataset of canned UX scenarios
    CreateDataset {
        #[arg(long, default_value_t = 50)]
        count: usize,
        #[arg(long, value_name = "FILE", default_value = "benchmarks/dataset.json")]
        output: PathBuf,
    },

    /// Judge every dataset example and write predictions
    Predict {
        #[arg(long, value_name = "FILE")]
        dataset: PathBuf,
        #[arg(long, value_name = "FILE", default_value = "predictions.json")]
        output: PathBuf,
        /// Directory relative screenshot paths resolve against
        #[arg(long, value_name = "DIR", default_value = ".")]
        base_dir: PathBuf,
    },

    /// Score predictions against the dataset ground truth
    Evaluate {
        #[arg(long, value_name = "FILE")]
        dataset: PathBuf,
        #[arg(long, value_name = "FILE")]
        results: PathBuf,
        #[arg(long, value_name = "FILE", default_value = "evaluation_report.json")]
        output: PathBuf,
    },
}

pub async fn cmd_bench(args: BenchArgs, config: Config, format: OutputFormat) -> Result<()> {
    match args.command {
        BenchCommand::CreateDataset { count, output } => {
            let dataset = generate_mock_dataset(count, Utc::now());
            write_json(&output, &dataset).await?;
            println!(
                "Generated {} examples -> {}",
                dataset.examples.len(),
                output.display()
            );
        }
        BenchCommand::Predict {
            dataset,
            output,
            base_dir,
        } => {
            let dataset: Dataset = read_json(&dataset).await?;
            let context = AppContext::open(config)?;
            let judge = context
                .vision_judge()
                .context("Vision judge is required for predictions")?;

            let outcome = predict(&dataset, &base_dir, &judge).await;
            write_json(&output, &outcome.predictions).await?;
            drop(judge);
            context.close()?;

            let hits = outcome
                .predictions
                .predictions
                .iter()
                .filter(|p| p.cache_hit)
                .count();
            let cost: f64 = outcome.predictions.predictions.iter().map(|p| p.cost).sum();
            println!(
                "Predicted {} examples ({} cached, {} skipped), cost ${:.4}",
                outcome.predictions.predictions.len(),
                hits,
                outcome.skipped.len(),
                cost
            );
            println!("Predictions written to {}", output.display());
        }
        BenchCommand::Evaluate {
            dataset,
            results,
            output,
        } => {
            let dataset: Dataset = read_json(&dataset).await?;
            let predictions: PredictionSet = read_json(&results).await?;
            let report = evaluate(&dataset, &predictions);
            write_json(&output, &report).await?;
            info!(output = %output.display(), "Evaluation report written");

            if !print_structured(&report, format)? {
                println!("Evaluation Results");
                println!("  Accuracy:  {:.2}%", report.accuracy * 100.0);
                println!("  Precision: {:.2}%", report.precision * 100.0);
                println!("  Recall:    {:.2}%", report.recall * 100.0);
                println!("  F1 Score:  {:.2}%", report.f1_score * 100.0);
                println!();
                println!(
                    "  TP: {} | FP: {}",
                    report.true_positives, report.false_positives
                );
                println!(
                    "  TN: {} | FN: {}",
                    report.true_negatives, report.false_negatives
                );
            }
        }
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, text)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
