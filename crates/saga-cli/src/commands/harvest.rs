use std::process::ExitCode;
use std::sync::Arc;

use saga_engine::SagaContext;
use saga_workflows::harvest::{HarvestData, TaxLossHarvestingSaga};

use super::{HarvestArgs, exit_code};
use crate::demo;
use crate::error::Result;
use crate::output::{self, ProgressListener};

pub(crate) fn run(args: HarvestArgs) -> Result<ExitCode> {
    let saga = if args.json {
        TaxLossHarvestingSaga::with_threshold(args.threshold)
    } else {
        TaxLossHarvestingSaga::with_listener(args.threshold, Arc::new(ProgressListener))
    };

    let mut data = demo::harvest_data();
    data.simulate_replacement_failure = args.fail_replacement;

    if !args.json {
        println!(
            "Scanning {} tax lots for losses above ${:.2}\n",
            data.tax_lots.len(),
            args.threshold
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
        // The summary only exists once the final step has run.
        if let Some(summary) = &result.context.data.summary {
            println!(
                "Harvested ${:.2} in losses across {} positions, ${:.2} reinvested",
                summary.total_losses_harvested,
                summary.positions_harvested,
                summary.total_reinvested
            );
        }
    }

    Ok(exit_code(result.status))
}
