// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bulk rule synchronization.
//!
//! Applies many routing intents to one snapshot so that a whole batch of adds
//! or removes lands in a single apply. Iteration is always in rule ID order
//! (`BTreeMap`), which keeps the resulting document reproducible.

use super::naming::listener_name;
use super::rules::{add_rule, remove_rule};
use super::types::{ApplicationGateway, RoutingIntent};
use crate::constants::RULE_STATUS_SUCCESS;
use crate::errors::GatewayError;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Publish every `(rule_id, hostname)` pair onto the load balancer's pool.
///
/// # Errors
///
/// Stops at the first rule that cannot be added (see [`add_rule`]). The caller
/// must discard the snapshot rather than apply a partially mutated one.
pub fn add_all_rules(
    gateway: &mut ApplicationGateway,
    load_balancer_id: &str,
    hostnames_by_rule_id: &BTreeMap<String, String>,
) -> Result<(), GatewayError> {
    for (rule_id, hostname) in hostnames_by_rule_id {
        add_rule(gateway, load_balancer_id, rule_id, hostname)?;
    }
    if !hostnames_by_rule_id.is_empty() {
        info!(
            load_balancer = load_balancer_id,
            count = hostnames_by_rule_id.len(),
            "Added routing rules to gateway snapshot"
        );
    }
    Ok(())
}

/// Remove every rule whose recorded status is [`RULE_STATUS_SUCCESS`].
///
/// Rules in any other state (pending, failed, ...) are left alone, since they
/// may still be awaiting creation.
///
/// Returns the rule IDs that were removed.
pub fn remove_all_rules(
    gateway: &mut ApplicationGateway,
    status_by_rule_id: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut removed = Vec::new();
    for (rule_id, status) in status_by_rule_id {
        if status == RULE_STATUS_SUCCESS {
            remove_rule(gateway, rule_id);
            removed.push(rule_id.clone());
        } else {
            debug!(rule_id = %rule_id, status = %status, "Keeping rule not marked as published");
        }
    }
    removed
}

/// Select the intents whose listener is not on the gateway yet.
///
/// Intents whose `<rule_id>-cps-listener` already exists are dropped, so an
/// existing listener is never re-added under a different hostname. When the
/// same rule ID appears more than once, the first hostname wins.
#[must_use]
pub fn filter_listeners_by_owner(
    gateway: &ApplicationGateway,
    intents: &[RoutingIntent],
) -> BTreeMap<String, String> {
    let mut selected = BTreeMap::new();
    for intent in intents {
        if gateway
            .http_listener(&listener_name(&intent.rule_id))
            .is_some()
        {
            debug!(rule_id = %intent.rule_id, "Listener already present, skipping");
            continue;
        }
        selected
            .entry(intent.rule_id.clone())
            .or_insert_with(|| intent.hostname.clone());
    }
    selected
}

/// Parse a serialized rule status record.
///
/// The record is a JSON object mapping rule IDs to status strings. Records
/// stored in annotations are often written with single quotes
/// (`{'r1': 'Success'}`); those are normalised before parsing. An empty or
/// whitespace-only record is an empty map.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedStatusRecord`] if the record is not a JSON
/// object of strings.
pub fn parse_rule_status(raw: &str) -> Result<BTreeMap<String, String>, GatewayError> {
    let normalized = raw.trim().replace('\'', "\"");
    if normalized.is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&normalized).map_err(|e| GatewayError::MalformedStatusRecord {
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
