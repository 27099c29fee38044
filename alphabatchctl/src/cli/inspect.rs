use alphabatch_core::catalog::IdentifierCatalog;
use alphabatch_core::expression::validate_template;
use alphabatch_core::templates::{AlphaTemplate, TemplateCatalog};
use anyhow::Context;

use super::{SaveTemplateArgs, TemplatesCommand};
use super::context::AppContext;

pub fn templates(ctx: &AppContext, command: TemplatesCommand) -> anyhow::Result<()> {
    let path = &ctx.config.paths.templates_file;
    let mut catalog = TemplateCatalog::load(path)
        .with_context(|| format!("failed to read templates from {}", path.display()))?;

    match command {
        TemplatesCommand::List => {
            if catalog.is_empty() {
                println!("no templates in {}", path.display());
            }
            for name in catalog.names() {
                if let Some(template) = catalog.get(name) {
                    println!("{name}\t{}", template.alpha_expression);
                }
            }
        }
        TemplatesCommand::Check { name } => {
            let template = catalog.require(&name).context("unknown template")?;
            validate_template(&template.expression())
                .with_context(|| format!("template '{name}' is invalid"))?;
            println!("{name}: ok ({})", template.expression());
        }
        TemplatesCommand::Save(args) => {
            let name = args.name.clone();
            let template = template_from_args(args);
            validate_template(&template.expression())
                .with_context(|| format!("template '{name}' is invalid"))?;
            catalog
                .save(name.clone(), template)
                .with_context(|| format!("failed to save template '{name}'"))?;
            println!("saved {name} to {}", path.display());
        }
    }
    Ok(())
}

fn template_from_args(args: SaveTemplateArgs) -> AlphaTemplate {
    let defaults = AlphaTemplate::default();
    AlphaTemplate {
        alpha_expression: args.expression,
        region: args.region.unwrap_or(defaults.region.clone()),
        universe: args.universe.unwrap_or(defaults.universe.clone()),
        delay: args.delay.unwrap_or(defaults.delay),
        decay: args.decay.unwrap_or(defaults.decay),
        neutralization: args
            .neutralization
            .unwrap_or(defaults.neutralization.clone()),
        truncation: args.truncation.unwrap_or(defaults.truncation),
        ..defaults
    }
}

pub fn datasets(ctx: &AppContext) -> anyhow::Result<()> {
    let catalog = IdentifierCatalog::new(&ctx.config.paths.identifiers_dir);
    let names = catalog.datasets().context("failed to list datasets")?;
    if names.is_empty() {
        println!("no datasets in {}", catalog.dir().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

pub async fn results(ctx: &AppContext, unsubmitted: bool) -> anyhow::Result<()> {
    let table = ctx
        .store()
        .load()
        .await
        .context("failed to read stored results")?;

    println!("alpha_id\tsharpe\tfitness\tsubmitted\tformula");
    for record in table
        .records()
        .iter()
        .filter(|record| !unsubmitted || !record.submitted)
    {
        let values = record.check_values;
        println!(
            "{}\t{:.2}\t{:.2}\t{}\t{}",
            record.alpha_id,
            values.low_sharpe,
            values.low_fitness,
            record.submitted,
            record.formula
        );
    }
    Ok(())
}
