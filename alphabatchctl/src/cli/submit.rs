use std::sync::Arc;

use alphabatch_core::{
    SubmissionPoller, SubmissionReport, SubmissionWorkflow, TracingObserver,
};
use alphabatch_model::AlphaId;
use anyhow::{Context, bail};

use super::context::{AppContext, ctrl_c_token};

async fn workflow(ctx: &AppContext) -> anyhow::Result<SubmissionWorkflow> {
    let client = ctx.connect().await?;
    let poller = SubmissionPoller::new(client, ctx.config.submission)
        .with_observer(Arc::new(TracingObserver))
        .with_cancellation(ctrl_c_token());
    Ok(SubmissionWorkflow::new(poller, ctx.store()))
}

pub async fn submit_one(ctx: &AppContext, alpha_id: &str) -> anyhow::Result<()> {
    let alpha_id = AlphaId::new(alpha_id.trim());
    if alpha_id.is_empty() {
        bail!("alpha id must not be empty");
    }

    let report = workflow(ctx).await?.submit_one(&alpha_id).await;
    print_report(&report);
    Ok(())
}

pub async fn submit_batch(ctx: &AppContext) -> anyhow::Result<()> {
    let pending = ctx
        .store()
        .unsubmitted()
        .await
        .context("failed to read stored results")?;
    if pending.is_empty() {
        println!("nothing to submit");
        return Ok(());
    }

    let reports = workflow(ctx)
        .await?
        .submit_all()
        .await
        .context("failed to read pending submissions")?;
    let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
    for report in &reports {
        print_report(report);
    }
    println!("{succeeded}/{} submitted", pending.len());
    Ok(())
}

fn print_report(report: &SubmissionReport) {
    if report.outcome.is_success() && !report.recorded {
        println!(
            "{}: {} (not recorded in the result file)",
            report.alpha_id, report.outcome
        );
    } else {
        println!("{}: {}", report.alpha_id, report.outcome);
    }
}
