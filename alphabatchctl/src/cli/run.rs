use std::sync::Arc;

use alphabatch_core::catalog::IdentifierCatalog;
use alphabatch_core::expression::validate_template;
use alphabatch_core::templates::TemplateCatalog;
use alphabatch_core::{RunPlan, SimulationOrchestrator, TracingObserver};
use alphabatch_model::MaxConcurrency;
use anyhow::Context;
use tracing::info;

use super::RunArgs;
use super::context::{AppContext, ctrl_c_token};

pub async fn execute(ctx: &AppContext, args: RunArgs) -> anyhow::Result<()> {
    let paths = &ctx.config.paths;

    let templates = TemplateCatalog::load(&paths.templates_file).with_context(|| {
        format!("failed to read templates from {}", paths.templates_file.display())
    })?;
    let template = templates
        .require(&args.template)
        .context("unknown template")?;
    let expression = template.expression();
    validate_template(&expression)
        .with_context(|| format!("template '{}' is not usable", args.template))?;

    let identifiers = IdentifierCatalog::new(&paths.identifiers_dir)
        .load(&args.dataset)
        .with_context(|| format!("failed to load dataset '{}'", args.dataset))?;

    let mut config = ctx.config.orchestrator;
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency =
            MaxConcurrency::new(concurrency).context("invalid --concurrency")?;
    }

    let client = ctx.connect().await?;
    info!(
        template = %args.template,
        dataset = %args.dataset,
        identifiers = identifiers.len(),
        "starting run"
    );

    let plan = RunPlan {
        template: expression,
        settings: template.settings(),
        identifiers,
    };
    let summary = SimulationOrchestrator::new(client, ctx.store(), config, plan)
        .with_observer(Arc::new(TracingObserver))
        .with_cancellation(ctrl_c_token())
        .run()
        .await
        .context("run aborted")?;

    println!("{summary}");
    if summary.was_cancelled {
        println!("run cancelled; {} jobs abandoned", summary.cancelled);
    }
    Ok(())
}
