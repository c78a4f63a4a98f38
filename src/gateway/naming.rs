// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic names and resource IDs for reconciler-owned sub-resources.
//!
//! Re-running a reconciliation must find what an earlier run created, so every
//! name is derived from the load balancer identifier or the rule identifier and
//! nothing else.

use crate::constants::{
    BACKEND_POOLS_SEGMENT, BACKEND_POOL_SUFFIX, HTTP_LISTENERS_SEGMENT, LISTENER_SUFFIX,
    ROUTING_RULE_SUFFIX,
};

/// `<load_balancer_id>-backendpool`
#[must_use]
pub fn pool_name(load_balancer_id: &str) -> String {
    format!("{load_balancer_id}{BACKEND_POOL_SUFFIX}")
}

/// `<rule_id>-cps-listener`
#[must_use]
pub fn listener_name(rule_id: &str) -> String {
    format!("{rule_id}{LISTENER_SUFFIX}")
}

/// `<rule_id>-cps-rule`
#[must_use]
pub fn rule_name(rule_id: &str) -> String {
    format!("{rule_id}{ROUTING_RULE_SUFFIX}")
}

/// Prefix of `port_id` up to and including the first occurrence of `gateway_name`.
///
/// The whole `port_id` is returned when the gateway name does not occur in it
/// (or is empty).
///
/// # Example
///
/// ```rust
/// use appgw_sync::gateway::naming::id_prefix;
///
/// let port = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/applicationGateways/agw/frontendPorts/p1";
/// assert_eq!(
///     id_prefix(port, "agw"),
///     "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/applicationGateways/agw"
/// );
/// ```
#[must_use]
pub fn id_prefix<'a>(port_id: &'a str, gateway_name: &str) -> &'a str {
    if gateway_name.is_empty() {
        return port_id;
    }
    match port_id.find(gateway_name) {
        Some(start) => &port_id[..start + gateway_name.len()],
        None => port_id,
    }
}

/// `<prefix>/backendAddressPools/<pool_name>`
#[must_use]
pub fn backend_pool_id(prefix: &str, pool_name: &str) -> String {
    format!("{prefix}{BACKEND_POOLS_SEGMENT}{pool_name}")
}

/// `<prefix>/httpListeners/<listener_name>`
#[must_use]
pub fn listener_id(prefix: &str, listener_name: &str) -> String {
    format!("{prefix}{HTTP_LISTENERS_SEGMENT}{listener_name}")
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;
