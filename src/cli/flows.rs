use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use flowguard::{load_flows, AppContext, Config};
use flowguard_core_types::FlowDefinition;
use query_guard::{Identifier, RecentResultsQuery, RunSummaryQuery, SearchQuery};
use serde_json::Value;

use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct FlowsArgs {
    #[command(subcommand)]
    pub command: FlowsCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum FlowsCommand {
    /// Store every flow in a JSON or YAML file, replacing same-named flows
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List stored flows
    List,

    /// Show one stored flow
    Show { name: String },

    /// Find flows whose name or intent contains a term
    Search { term: String },

    /// Remove a stored flow
    Delete { name: String },

    /// Most recent run results of a flow, newest first
    Recent {
        name: String,
        /// Number of results (1-100)
        #[arg(short, long)]
        limit: Option<String>,
    },

    /// Verdict counts of a flow over recent days
    Summary {
        name: String,
        /// Look-back window in days (1-365)
        #[arg(long)]
        days: Option<String>,
    },
}

pub async fn cmd_flows(args: FlowsArgs, config: Config, format: OutputFormat) -> Result<()> {
    let context = AppContext::open(config)?;
    let repository = context.repository();

    match args.command {
        FlowsCommand::Import { file } => {
            let flows = load_flows(&file)
                .await
                .with_context(|| format!("Failed to load flows from {}", file.display()))?;
            for flow in &flows {
                let outcome = repository.save_flow(flow)?;
                println!("{:?}: {}", outcome, flow.name);
            }
        }
        FlowsCommand::List => {
            let flows = repository.list_flows()?;
            if !print_structured(&flows, format)? {
                print_flow_table(&flows);
            }
        }
        FlowsCommand::Show { name } => {
            let name = Identifier::parse("flowName", &name)?;
            let Some(flow) = repository.get_flow(&name)? else {
                bail!("No flow named '{}'", name);
            };
            // a single flow has no useful table form
            let format = if format == OutputFormat::Human {
                OutputFormat::Yaml
            } else {
                format
            };
            print_structured(&flow, format)?;
        }
        FlowsCommand::Search { term } => {
            let query = SearchQuery::parse(&term)?;
            let flows = repository.search_flows(&query)?;
            if !print_structured(&flows, format)? {
                print_flow_table(&flows);
            }
        }
        FlowsCommand::Delete { name } => {
            let name = Identifier::parse("flowName", &name)?;
            if !repository.delete_flow(&name)? {
                bail!("No flow named '{}'", name);
            }
            println!("Deleted {}", name);
        }
        FlowsCommand::Recent { name, limit } => {
            let query = RecentResultsQuery::from_params(&Value::String(name), &optional(limit))?;
            let results = repository.recent_results(&query)?;
            if !print_structured(&results, format)? {
                for result in &results {
                    println!(
                        "{}  {:<5}  {:>7}ms  {}",
                        result.started_at.format("%Y-%m-%d %H:%M:%S"),
                        result.verdict,
                        result.duration_ms,
                        result.run_id
                    );
                }
                if results.is_empty() {
                    println!("No results recorded for {}", query.flow_name);
                }
            }
        }
        FlowsCommand::Summary { name, days } => {
            let query = RunSummaryQuery::from_params(&Value::String(name), &optional(days))?;
            let summary = repository.run_summary(&query, Utc::now())?;
            if !print_structured(&summary, format)? {
                println!("{} over the last {} days", summary.flow_name, summary.days);
                println!("- Runs: {}", summary.total);
                println!("- Passed: {}", summary.passed);
                println!("- Failed: {}", summary.failed);
                println!("- Errored: {}", summary.errored);
                println!("- Pass rate: {:.1}%", summary.pass_rate() * 100.0);
                if let Some(avg) = summary.avg_duration_ms {
                    println!("- Avg duration: {:.0}ms", avg);
                }
            }
        }
    }

    context.close()
}

fn optional(raw: Option<String>) -> Value {
    raw.map(Value::String).unwrap_or(Value::Null)
}

fn print_flow_table(flows: &[FlowDefinition]) {
    if flows.is_empty() {
        println!("No flows found");
        return;
    }
    for flow in flows {
        println!("{:<24} {:>3} steps  {}", flow.name, flow.steps.len(), flow.url);
        if !flow.intent.is_empty() {
            println!("    {}", flow.intent);
        }
    }
}
