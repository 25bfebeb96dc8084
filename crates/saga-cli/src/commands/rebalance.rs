use std::process::ExitCode;
use std::sync::Arc;

use saga_engine::SagaContext;
use saga_workflows::rebalance::{RebalanceData, RebalanceSaga};

use super::{RebalanceArgs, exit_code};
use crate::demo;
use crate::error::Result;
use crate::output::{self, ProgressListener};

pub(crate) fn run(args: RebalanceArgs) -> Result<ExitCode> {
    let saga = if args.json {
        RebalanceSaga::new()
    } else {
        RebalanceSaga::with_listener(Arc::new(ProgressListener))
    };

    let mut data = RebalanceData::new(demo::portfolio(), demo::proposed_trades());
    data.simulate_buy_failure = args.fail_buys;

    if !args.json {
        println!(
            "Rebalancing a ${:.2} portfolio with {} proposed trades\n",
            data.portfolio.total_value(),
            data.proposed_trades.len()
        );
    }

    let mut context = SagaContext::new(data);
    if let Some(transaction_id) = args.transaction_id {
        context = context.with_transaction_id(transaction_id);
    }

    let result = saga.run_context(context);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_report(
            result.status,
            &result.transaction_id,
            &result.logs,
            result.error.as_deref(),
        );
    }

    Ok(exit_code(result.status))
}
