mod harvest;
mod rebalance;

use std::process::ExitCode;

use clap::{Args, Subcommand};

use saga_engine::SagaStatus;
use saga_workflows::harvest::DEFAULT_MIN_LOSS_THRESHOLD;

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Rebalance the demo portfolio (sell overweight, then buy underweight)
    Rebalance(RebalanceArgs),
    /// Harvest tax losses from the demo tax lots
    Harvest(HarvestArgs),
}

#[derive(Args)]
pub(crate) struct RebalanceArgs {
    /// Inject a failure into the final buy leg to demonstrate rollback
    #[arg(long)]
    pub(crate) fail_buys: bool,

    /// Explicit transaction id (otherwise derived from the request content)
    #[arg(long)]
    pub(crate) transaction_id: Option<String>,

    /// Print the full result as JSON instead of the step report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args)]
pub(crate) struct HarvestArgs {
    /// Minimum unrealized loss, in dollars, for a lot to be harvested
    #[arg(long, default_value_t = DEFAULT_MIN_LOSS_THRESHOLD)]
    pub(crate) threshold: f64,

    /// Inject a failure into the replacement purchase to demonstrate rollback
    #[arg(long)]
    pub(crate) fail_replacement: bool,

    /// Explicit transaction id (otherwise derived from the request content)
    #[arg(long)]
    pub(crate) transaction_id: Option<String>,

    /// Print the full result as JSON instead of the step report
    #[arg(long)]
    pub(crate) json: bool,
}

impl Commands {
    pub(crate) fn execute(self) -> Result<ExitCode> {
        match self {
            Self::Rebalance(args) => rebalance::run(args),
            Self::Harvest(args) => harvest::run(args),
        }
    }
}

pub(crate) fn exit_code(status: SagaStatus) -> ExitCode {
    if status == SagaStatus::Success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
