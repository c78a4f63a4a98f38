// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line and environment configuration for the `appgw-sync` binary.
//!
//! Every gateway coordinate can come from a flag or from its environment
//! variable, so the binary runs unchanged from a shell or from a Pod spec.

use crate::constants::{DEFAULT_ARM_API_VERSION, DEFAULT_ARM_ENDPOINT};
use crate::gateway::{ArmGatewayClient, BackendAddress, GatewayTarget, RoutingIntent};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};

/// Reconcile Azure Application Gateway pools and routing rules.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Print Prometheus metrics to stdout after the command finishes
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Coordinates of the target gateway and how to reach the control plane.
#[derive(Args, Debug, Clone)]
pub struct GatewayArgs {
    /// Azure subscription ID
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription_id: String,

    /// Resource group holding the application gateway
    #[arg(long, env = "AZURE_RESOURCE_GROUP")]
    pub resource_group: String,

    /// Application gateway name; empty means no gateway is configured
    #[arg(long, env = "AZURE_APP_GATEWAY_NAME", default_value = "")]
    pub gateway_name: String,

    /// Bearer token for Azure Resource Manager
    #[arg(long, env = "AZURE_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    pub access_token: String,

    /// Azure Resource Manager endpoint
    #[arg(long, env = "ARM_ENDPOINT", default_value = DEFAULT_ARM_ENDPOINT)]
    pub arm_endpoint: String,

    /// Network API version
    #[arg(long, env = "ARM_API_VERSION", default_value = DEFAULT_ARM_API_VERSION)]
    pub api_version: String,
}

impl GatewayArgs {
    #[must_use]
    pub fn target(&self) -> GatewayTarget {
        GatewayTarget::new(&self.resource_group, &self.gateway_name)
    }

    /// Build the ARM client for these coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the ARM endpoint is not a valid base URL.
    pub fn client(&self) -> Result<ArmGatewayClient> {
        ArmGatewayClient::with_endpoint(
            &self.arm_endpoint,
            &self.subscription_id,
            &self.api_version,
            &self.access_token,
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the current gateway document as JSON
    Show,
    /// Install a load balancer's backend pool and publish its missing rules
    SyncPool(SyncPoolArgs),
    /// Remove a load balancer's backend pool and its published rules
    DeletePool(DeletePoolArgs),
    /// Replace the members of an existing backend pool
    RefreshPool(PoolMembersArgs),
    /// Publish a single routing rule
    AddRule(AddRuleArgs),
    /// Withdraw a single routing rule
    RemoveRule(RemoveRuleArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PoolMembersArgs {
    /// Load balancer identifier owning the pool
    #[arg(long)]
    pub load_balancer: String,

    /// Backend member, IP address or FQDN (repeatable)
    #[arg(long = "address", value_parser = parse_address)]
    pub addresses: Vec<BackendAddress>,
}

#[derive(Args, Debug, Clone)]
pub struct SyncPoolArgs {
    #[command(flatten)]
    pub pool: PoolMembersArgs,

    /// Route to publish, as `rule_id=hostname` (repeatable)
    #[arg(long = "route", value_parser = parse_route)]
    pub routes: Vec<RoutingIntent>,

    #[command(flatten)]
    pub ingress: IngressArgs,
}

impl SyncPoolArgs {
    /// Whether any route source was requested.
    #[must_use]
    pub fn has_routes(&self) -> bool {
        !self.routes.is_empty() || self.ingress.from_ingresses
    }
}

/// Source routes from Kubernetes Ingresses.
#[derive(Args, Debug, Clone, Default)]
pub struct IngressArgs {
    /// Add one route per Ingress (name as rule ID, first rule host as hostname)
    #[arg(long)]
    pub from_ingresses: bool,

    /// Namespace to list Ingresses from; all namespaces when omitted
    #[arg(long, requires = "from_ingresses")]
    pub ingress_namespace: Option<String>,

    /// Label selector for Ingresses (e.g. `app=web`)
    #[arg(long, requires = "from_ingresses")]
    pub ingress_selector: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeletePoolArgs {
    /// Load balancer identifier owning the pool
    #[arg(long)]
    pub load_balancer: String,

    /// Rule status record, e.g. `{'r1': 'Success'}`; only `Success` rules are removed
    #[arg(long)]
    pub rule_status: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddRuleArgs {
    /// Load balancer identifier whose pool the rule routes to
    #[arg(long)]
    pub load_balancer: String,

    /// Route to publish, as `rule_id=hostname`
    #[arg(long, value_parser = parse_route)]
    pub route: RoutingIntent,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveRuleArgs {
    /// Rule identifier to withdraw
    #[arg(long)]
    pub rule_id: String,
}

/// Parse `rule_id=hostname`.
///
/// # Errors
///
/// Returns a message when either side is missing.
pub fn parse_route(value: &str) -> Result<RoutingIntent, String> {
    match value.split_once('=') {
        Some((rule_id, hostname)) if !rule_id.trim().is_empty() && !hostname.trim().is_empty() => {
            Ok(RoutingIntent::new(rule_id.trim(), hostname.trim()))
        }
        _ => Err(format!("expected rule_id=hostname, got '{value}'")),
    }
}

fn parse_address(value: &str) -> Result<BackendAddress, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("backend address must not be empty".to_string());
    }
    Ok(BackendAddress::parse(value))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
