mod check;
mod cli;
mod config;
mod errors;
mod extract;
mod jsonquery;
mod kubernetes;
mod reporter;
mod types;
mod utils;

use clap::Parser;
use kube::{Client, config as kubeconfig};
use tracing::{error, info};

use check::KubeApiserverCheck;
use cli::Cli;
use kubernetes::KubeResourceClient;
use reporter::JsonLinesReporter;
use types::CheckContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Records go to stdout, logs to stderr
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rules_file = config::load_rules(&cli.rules_file)?;
    let rules = rules_file.select(&cli.rules)?;

    let client = initialize_client(cli.context.as_deref()).await?;
    let resource_client = KubeResourceClient::new(client);
    let reporter = JsonLinesReporter::stdout();

    let mut failed = 0;
    for rule in &rules {
        let mut resource = rule.resource.clone();
        if resource.namespace.is_empty()
            && let Some(ns) = &cli.namespace
        {
            resource.namespace = ns.clone();
        }

        let result = match KubeApiserverCheck::new(
            CheckContext::new(&rule.id),
            resource,
            resource_client.clone(),
            &reporter,
        ) {
            Ok(check) => check.with_query_timeout(cli.query_timeout()).run().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!("[{}] Check completed", rule.id),
            Err(e) => {
                error!("[{}] {}", rule.id, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} rules failed", failed, rules.len());
    }
    Ok(())
}

async fn initialize_client(context: Option<&str>) -> anyhow::Result<Client> {
    let config = match context {
        Some(ctx) => kubeconfig::Config::from_kubeconfig(&kubeconfig::KubeConfigOptions {
            context: Some(ctx.to_string()),
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!("Context '{}' not found in kubeconfig: {}", ctx, e))?,
        None => kubeconfig::Config::infer().await?,
    };
    let client = Client::try_from(config)?;
    info!("Initialized client for context: {}", context.unwrap_or("current"));
    Ok(client)
}
