// ABOUTME: Entry point for the stratus CLI application.
// ABOUTME: Parses arguments and dispatches to the deployment pipeline.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use stratus::catalog::CatalogClient;
use stratus::config::{self, PlatformConfig};
use stratus::deploy::{DeployRequest, Orchestrator};
use stratus::error::{Error, Result};
use stratus::manifest;
use stratus::output::Output;
use stratus::repo::GithubContent;
use stratus::runner::CfCli;
use stratus::session::TokenPair;
use stratus::types::Target;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mode = cli.output_mode();

    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)
        }
        Commands::Manifest { source } => {
            let source = source.to_source();
            let repo = GithubContent::new();
            let descriptor = manifest::load(&repo, &source).await?;

            println!("Environment:");
            for (name, var) in &descriptor.env {
                let requirement = if var.required { "required" } else { "optional" };
                println!("  {name} ({requirement}): {}", var.description);
            }
            println!("Services:");
            for service in &descriptor.services {
                println!(
                    "  {} ({} / {})",
                    service.label, service.offering, service.plan
                );
            }
            Ok(())
        }
        Commands::Targets => {
            let cwd = env::current_dir()?;
            let config = PlatformConfig::discover(&cwd)?;
            let token = session_token()?;

            let targets = CatalogClient::new(&config.api_url).targets(&token).await?;
            for target in targets {
                println!("{}/{}\t{}", target.org_name, target.space_name, target);
            }
            Ok(())
        }
        Commands::Deploy {
            source,
            target,
            env: env_pairs,
            service_timeout,
        } => {
            let cwd = env::current_dir()?;
            let config = PlatformConfig::discover(&cwd)?;
            let token = session_token()?;

            let parsed_target = target
                .parse::<Target>()
                .map_err(|_| Error::InvalidTarget(target.clone()))?;

            let request = DeployRequest {
                source: source.to_source(),
                target: parsed_target,
                values: parse_env_values(&env_pairs)?,
                service_timeout: service_timeout
                    .map(Duration::from_secs)
                    .unwrap_or(config.service_timeout),
            };

            // Ctrl-C ends the provisioning wait early; the per-service
            // timeout remains the fallback bound.
            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::warn!("interrupt received, cancelling deployment wait");
                        cancel.cancel();
                    }
                });
            }

            let mut output = Output::new(mode);
            output.start_timer();

            let runner = CfCli::new(&config.cli_bin);
            let orchestrator = Orchestrator::new(config, GithubContent::new(), runner)
                .with_cancellation(cancel);

            let deployed = orchestrator.deploy(&token, &request, &output).await?;

            output.success(
                &format!("Deployed {} at {}", deployed.app, deployed.route),
                Some(&deployed.route),
            );
            Ok(())
        }
    }
}

/// Token for the current operator session, handed in by the identity
/// collaborator via the environment.
fn session_token() -> Result<TokenPair> {
    let access_token = env::var("STRATUS_ACCESS_TOKEN").map_err(|_| Error::Unauthenticated)?;

    Ok(TokenPair {
        token_type: env::var("STRATUS_TOKEN_TYPE").unwrap_or_else(|_| "bearer".to_string()),
        access_token,
        refresh_token: env::var("STRATUS_REFRESH_TOKEN").unwrap_or_default(),
    })
}

fn parse_env_values(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::InvalidEnvPair(pair.clone()))?;
        values.insert(name.to_string(), value.to_string());
    }
    Ok(values)
}
