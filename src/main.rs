use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod cli;

use cli::bench::cmd_bench;
use cli::cache::cmd_cache;
use cli::commands::Commands;
use cli::env::CliArgs;
use cli::flows::cmd_flows;
use cli::info::cmd_info;
use cli::run::cmd_run;
use cli::runtime::{init_logging, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.json_logs)?;

    info!("Starting FlowGuard v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_ref()).await?;
    let config = loaded.config;

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, config, cli.output).await,
        Commands::Flows(args) => cmd_flows(args, config, cli.output).await,
        Commands::Cache(args) => cmd_cache(args, config, cli.output).await,
        Commands::Bench(args) => cmd_bench(args, config, cli.output).await,
        Commands::Info => cmd_info(&config, &loaded.path).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
