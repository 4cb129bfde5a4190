use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cdp_adapter::ChromiumLauncher;
use clap::Args;
use flowguard::{load_flows, AppContext, Config};
use flowguard_core_types::FlowRunResult;
use flowguard_scheduler::ScheduleReport;
use tracing::{info, warn};

use super::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// JSON or YAML file holding one flow or an array of flows
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Maximum flows run at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Directory for screenshots
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Skip vision assertions
    #[arg(long)]
    pub no_vision: bool,

    /// Also store the loaded flows in the repository
    #[arg(long)]
    pub save: bool,
}

pub async fn cmd_run(args: RunArgs, mut config: Config, format: OutputFormat) -> Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.headful {
        config.browser.headless = false;
    }
    if args.no_vision {
        config.vision.enabled = false;
    }
    config.validate()?;

    let flows = load_flows(&args.file)
        .await
        .with_context(|| format!("Failed to load flows from {}", args.file.display()))?;
    info!(count = flows.len(), file = %args.file.display(), "Loaded flows");

    let context = AppContext::open(config)?;
    if args.save {
        for flow in &flows {
            let outcome = context.repository().save_flow(flow)?;
            info!(flow = %flow.name, ?outcome, "Saved flow");
        }
    }

    let launcher = Arc::new(ChromiumLauncher::new(context.config().browser.clone()));
    let judge = context.optional_vision_judge();
    let runner = context.runner(launcher, judge);
    let scheduler = context.scheduler(runner, context.config().concurrency)?;

    let mut sweeper = context.start_sweeper();
    let report = scheduler.run_all(flows).await;
    let metrics = flowguard_scheduler::metrics::snapshot();
    info!(
        dispatched = metrics.dispatched,
        completed = metrics.completed,
        passed = metrics.passed,
        failed = metrics.failed,
        errored = metrics.errored,
        panicked = metrics.panicked,
        "Scheduler counters"
    );
    sweeper.stop().await;
    drop(sweeper);
    drop(scheduler);
    if let Err(err) = context.close() {
        warn!(error = %err, "closing database failed");
    }

    if !print_structured(&report, format)? {
        print_report(&report);
    }

    let counts = report.counts();
    if counts.fail + counts.error > 0 {
        bail!(
            "{} of {} flows did not pass",
            counts.fail + counts.error,
            report.len()
        );
    }
    Ok(())
}

fn print_report(report: &ScheduleReport) {
    println!("FlowGuard Run Report");
    println!("====================");
    for result in &report.results {
        println!("{}", result_line(result));
        if let Some(step) = result.failed_step() {
            println!(
                "    step {} ({}): {}",
                step.step_index,
                step.action,
                step.error.as_deref().unwrap_or("failed")
            );
        }
    }
    let counts = report.counts();
    println!();
    println!(
        "{} passed, {} failed, {} errored in {}ms",
        counts.pass, counts.fail, counts.error, report.duration_ms
    );
}

fn result_line(result: &FlowRunResult) -> String {
    format!(
        "[{:<5}] {} ({} steps, {}ms)",
        result.verdict.as_str().to_uppercase(),
        result.flow_name,
        result.steps.len(),
        result.duration_ms
    )
}
