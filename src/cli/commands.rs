use clap::Subcommand;

use super::bench::BenchArgs;
use super::cache::CacheArgs;
use super::flows::FlowsArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run flows from a JSON or YAML file
    Run(RunArgs),

    /// Manage stored flows and inspect their results
    Flows(FlowsArgs),

    /// Inspect or sweep the vision verdict cache
    Cache(CacheArgs),

    /// Measure vision judgment accuracy on a labelled dataset
    Bench(BenchArgs),

    /// Show build and configuration information
    Info,
}
