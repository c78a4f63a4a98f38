// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use appgw_sync::{
    config::{Cli, Command, GatewayArgs, SyncPoolArgs},
    gateway::{
        ArmGatewayClient, GatewayReconciler, GatewayTarget, ReconcileOutcome, RoutingIntent,
    },
    ingress::list_ingress_intents,
    metrics::gather_metrics,
};
use clap::Parser;
use std::io::IsTerminal;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("appgw-sync")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_tracing() {
    // Logs go to stderr; stdout carries `show` output and metrics
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("appgw_sync=info,warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_target(false);

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_default();
    if log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder
            .with_ansi(std::io::stderr().is_terminal())
            .compact()
            .init();
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    init_tracing();
    debug!(command = ?cli.command, "appgw-sync starting");

    let result = run_command(&cli.gateway, cli.command).await;
    if let Err(e) = &result {
        error!("Command failed: {e:#}");
    }

    if cli.print_metrics {
        let metrics = gather_metrics().context("Failed to encode metrics")?;
        print!("{metrics}");
    }

    result
}

async fn run_command(gateway: &GatewayArgs, command: Command) -> Result<()> {
    let target = gateway.target();
    let reconciler = GatewayReconciler::new(gateway.client()?);

    info!(
        resource_group = %target.resource_group,
        gateway = %target.gateway_name,
        "Starting application gateway sync"
    );

    let outcome = match command {
        Command::Show => return show(&reconciler, &target).await,
        Command::SyncPool(args) => {
            let intents = collect_intents(&args).await?;
            let has_routes = args.has_routes();
            let load_balancer = args.pool.load_balancer;
            reconciler
                .sync_backend_pool(
                    &target,
                    &load_balancer,
                    args.pool.addresses,
                    has_routes.then_some(intents.as_slice()),
                )
                .await
                .with_context(|| format!("Failed to sync backend pool for {load_balancer}"))?
        }
        Command::DeletePool(args) => reconciler
            .delete_backend_pool(&target, &args.load_balancer, args.rule_status.as_deref())
            .await
            .with_context(|| {
                format!("Failed to delete backend pool for {}", args.load_balancer)
            })?,
        Command::RefreshPool(args) => reconciler
            .refresh_pool_members(&target, &args.load_balancer, args.addresses)
            .await
            .with_context(|| {
                format!("Failed to refresh backend pool for {}", args.load_balancer)
            })?,
        Command::AddRule(args) => reconciler
            .publish_rule(&target, &args.load_balancer, &args.route)
            .await
            .with_context(|| format!("Failed to publish rule {}", args.route.rule_id))?,
        Command::RemoveRule(args) => reconciler
            .withdraw_rule(&target, &args.rule_id)
            .await
            .with_context(|| format!("Failed to withdraw rule {}", args.rule_id))?,
    };

    report(&outcome);
    Ok(())
}

async fn show(reconciler: &GatewayReconciler<ArmGatewayClient>, target: &GatewayTarget) -> Result<()> {
    let gateway = reconciler
        .fetch(target)
        .await?
        .with_context(|| {
            format!(
                "Application gateway '{}' not found in resource group '{}'",
                target.gateway_name, target.resource_group
            )
        })?;
    println!("{}", serde_json::to_string_pretty(&gateway)?);
    Ok(())
}

/// Explicit `--route` values first, then one route per Ingress.
async fn collect_intents(args: &SyncPoolArgs) -> Result<Vec<RoutingIntent>> {
    let mut intents = args.routes.clone();
    if args.ingress.from_ingresses {
        let client = kube::Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        let from_ingresses = list_ingress_intents(
            client,
            args.ingress.ingress_namespace.as_deref(),
            args.ingress.ingress_selector.as_deref(),
        )
        .await?;
        info!(count = from_ingresses.len(), "Loaded routes from ingresses");
        intents.extend(from_ingresses);
    }
    Ok(intents)
}

fn report(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Applied { etag } => {
            info!(etag = etag.as_deref().unwrap_or_default(), "Gateway updated");
        }
        ReconcileOutcome::Skipped => info!("No application gateway configured, nothing to do"),
        ReconcileOutcome::PoolMissing => info!("Backend pool not found, nothing to do"),
    }
}
