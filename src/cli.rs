// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use stratus::output::OutputMode;
use stratus::repo::Source;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Deploy GitHub-hosted applications to a Cloud Foundry style platform")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a stratus.yml platform configuration template
    Init {
        /// Overwrite an existing stratus.yml
        #[arg(long)]
        force: bool,
    },

    /// Show a repository's environment contract and service dependencies
    Manifest {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List org/space targets visible to the current session token
    Targets,

    /// Deploy a repository to a target org and space
    Deploy {
        #[command(flatten)]
        source: SourceArgs,

        /// Target as org-guid:org-name:space-guid:space-name (see `targets`)
        #[arg(long)]
        target: String,

        /// Environment value NAME=VALUE (repeatable)
        #[arg(short = 'e', long = "env", value_name = "NAME=VALUE")]
        env: Vec<String>,

        /// Override the configured per-service provisioning timeout (seconds)
        #[arg(long, value_name = "SECONDS")]
        service_timeout: Option<u64>,
    },
}

#[derive(Args)]
pub struct SourceArgs {
    /// Repository owner
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Git reference (branch, tag, or commit)
    #[arg(long = "ref", default_value = "main")]
    pub reference: String,
}

impl SourceArgs {
    pub fn to_source(&self) -> Source {
        Source::new(&self.owner, &self.repo, &self.reference)
    }
}
