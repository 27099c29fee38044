use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let ctx = cli::context::AppContext::load(cli.config.clone())?;

    match cli.command {
        Command::Run(args) => cli::run::execute(&ctx, args).await,
        Command::Submit { alpha_id } => {
            cli::submit::submit_one(&ctx, &alpha_id).await
        }
        Command::SubmitBatch => cli::submit::submit_batch(&ctx).await,
        Command::Templates { command } => cli::inspect::templates(&ctx, command),
        Command::Datasets => cli::inspect::datasets(&ctx),
        Command::Results { unsubmitted } => {
            cli::inspect::results(&ctx, unsubmitted).await
        }
    }
}
