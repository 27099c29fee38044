use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod context;
pub mod inspect;
pub mod run;
pub mod submit;

#[derive(Parser, Debug)]
#[command(name = "alphabatchctl", version)]
#[command(about = "Batch alpha simulations against a rate-limited simulation service")]
pub struct Cli {
    /// Configuration file (TOML or JSON); overrides discovery
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a template against every identifier of a dataset
    Run(RunArgs),
    /// Submit one stored alpha to production
    Submit {
        /// Alpha id as reported by the service
        alpha_id: String,
    },
    /// Submit every stored alpha that has not been submitted yet
    SubmitBatch,
    /// Inspect saved alpha templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
    /// List identifier datasets
    Datasets,
    /// Print stored results
    Results {
        /// Only rows that have not been submitted
        #[arg(long)]
        unsubmitted: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Template name in the templates file
    #[arg(long)]
    pub template: String,

    /// Dataset name (`<identifiers_dir>/<dataset>.csv`)
    #[arg(long)]
    pub dataset: String,

    /// Simultaneous simulations (1-5); overrides the configured value
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub concurrency: Option<u8>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplatesCommand {
    /// List template names with their expressions
    List,
    /// Validate one template's expression
    Check {
        /// Template name
        name: String,
    },
    /// Add or replace a template; unspecified settings take the defaults
    Save(SaveTemplateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SaveTemplateArgs {
    /// Template name
    pub name: String,

    /// Expression with one placeholder, `{x}` or `$x$`
    #[arg(long)]
    pub expression: String,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub universe: Option<String>,

    #[arg(long)]
    pub delay: Option<u32>,

    #[arg(long)]
    pub decay: Option<u32>,

    #[arg(long)]
    pub neutralization: Option<String>,

    /// Truncation in percent
    #[arg(long)]
    pub truncation: Option<f64>,
}
