use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slop::cli::{Command, RootArgs, RunArgs};
use slop::engine::NoopEngine;
use slop::run::{run_model, RunSettings};
use slop::service::HttpService;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = RootArgs::parse();
    match cli.command {
        Command::Run(args) => cmd_run(args),
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let api_key = std::env::var("SLOP_API_KEY").ok();
    let service = HttpService::new(&args.api_url, api_key);
    let settings = RunSettings {
        network_id: args.network_id,
        scenario_ids: args.scenarios,
        run_name: args.run_name,
        debug: args.debug,
    };

    // CLI runs are unsupervised: nothing pauses or stops them.
    let summary = run_model(&service, &NoopEngine, &settings)?;
    if let Some(message) = &summary.step_error {
        tracing::warn!(
            completed = summary.completed_steps,
            total = summary.total_steps,
            %message,
            "run halted mid-horizon; partial results saved"
        );
    } else {
        tracing::info!(
            completed = summary.completed_steps,
            total = summary.total_steps,
            scenario = %summary.results_scenario,
            "run finished"
        );
    }
    Ok(())
}
