use anyhow::Result;
use clap::{Args, Subcommand};
use flowguard::{AppContext, Config};
use serde_json::json;

use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheCommand {
    /// Entry, live and hit counts
    Stats,
    /// Delete expired verdicts now
    Sweep,
}

pub async fn cmd_cache(args: CacheArgs, config: Config, format: OutputFormat) -> Result<()> {
    let context = AppContext::open(config)?;
    let cache = context.cache();

    match args.command {
        CacheCommand::Stats => {
            let stats = cache.stats()?;
            if !print_structured(&stats, format)? {
                println!("Vision Verdict Cache");
                println!("- Entries: {}", stats.entries);
                println!("- Live: {}", stats.live);
                println!("- Expired (awaiting sweep): {}", stats.expired());
                println!("- Total hits: {}", stats.total_hits);
                println!("- TTL: {}h", cache.ttl().num_hours());
            }
        }
        CacheCommand::Sweep => {
            let purged = cache.purge_expired()?;
            if !print_structured(&json!({ "purged": purged }), format)? {
                println!("Purged {} expired verdicts", purged);
            }
        }
    }

    context.close()
}
