// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Routing intents sourced from Kubernetes `Ingress` resources.
//!
//! Each Ingress becomes one intent: its name is the rule ID and the host of
//! its first rule is the hostname. Ingresses without a host cannot be routed
//! by hostname and are skipped.

use crate::constants::KUBE_LIST_PAGE_SIZE;
use crate::gateway::RoutingIntent;
use crate::retry::retry_api_call;
use anyhow::Result;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{api::ListParams, Api, Client};
use tracing::{debug, warn};

/// Build the routing intent for a single Ingress.
///
/// Returns `None` when the Ingress has no name or its first rule has no host.
#[must_use]
pub fn intent_from_ingress(ingress: &Ingress) -> Option<RoutingIntent> {
    let name = ingress.metadata.name.as_deref()?;
    let host = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.host.as_deref())
        .filter(|host| !host.is_empty());

    match host {
        Some(host) => Some(RoutingIntent::new(name, host)),
        None => {
            warn!(ingress = name, "Ingress has no host on its first rule, skipping");
            None
        }
    }
}

/// Routing intents for every routable Ingress, in input order.
#[must_use]
pub fn intents_from_ingresses(ingresses: &[Ingress]) -> Vec<RoutingIntent> {
    ingresses.iter().filter_map(intent_from_ingress).collect()
}

/// List Ingresses and convert them to routing intents.
///
/// # Arguments
///
/// * `client` - Kubernetes client
/// * `namespace` - Namespace to list from; all namespaces when `None`
/// * `label_selector` - Optional label selector (e.g. `app=web`)
///
/// # Errors
///
/// Returns an error if the Kubernetes API keeps failing after retries.
pub async fn list_ingress_intents(
    client: Client,
    namespace: Option<&str>,
    label_selector: Option<&str>,
) -> Result<Vec<RoutingIntent>> {
    let api: Api<Ingress> = match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    let mut list_params = ListParams::default().limit(KUBE_LIST_PAGE_SIZE);
    if let Some(selector) = label_selector {
        list_params = list_params.labels(selector);
    }

    let mut ingresses = Vec::new();
    loop {
        let page = retry_api_call(|| api.list(&list_params), "list ingresses").await?;
        ingresses.extend(page.items);

        match page.metadata.continue_ {
            Some(token) if !token.is_empty() => list_params.continue_token = Some(token),
            _ => break,
        }
    }

    let intents = intents_from_ingresses(&ingresses);
    debug!(
        ingresses = ingresses.len(),
        intents = intents.len(),
        "Collected routing intents from ingresses"
    );
    Ok(intents)
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod ingress_tests;
