//! CLI argument parsing for the reservoir model runner.
//!
//! The CLI is intentionally thin: it wires a single run without embedding
//! policy, so the same core can sit behind a task queue unchanged.
use clap::{Parser, Subcommand};

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "slop",
    version,
    about = "Daily single-reservoir operations model driven by layered scenario data",
    after_help = "Examples:\n  slop run --api-url http://localhost:5000 --network-id 1548 --scenarios 3610\n  slop run --api-url http://localhost:5000 --network-id 1548 --scenarios 3610,3682 --run-name 'wet year' --debug",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
}

/// Run one scenario combination against a network.
#[derive(Parser, Debug)]
#[command(about = "Run the model for one scenario combination")]
pub struct RunArgs {
    /// Base URL of the scenario service
    #[arg(long, value_name = "URL")]
    pub api_url: String,

    /// Network to simulate
    #[arg(long, value_name = "ID")]
    pub network_id: i64,

    /// Override scenario ids, outermost last
    #[arg(long, value_name = "IDS", value_delimiter = ',', num_args = 0..)]
    pub scenarios: Vec<i64>,

    /// Run name used to derive the results scenario name
    #[arg(long, value_name = "NAME", default_value = "run")]
    pub run_name: String,

    /// Truncate the horizon to a few days for a quick check
    #[arg(long)]
    pub debug: bool,
}
