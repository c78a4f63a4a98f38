// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP listener and request routing rule management.
//!
//! One routing intent maps to one listener/rule pair:
//!
//! - listener `<rule_id>-cps-listener`: binds the hostname to the port-80
//!   frontend port and the first frontend IP configuration
//! - rule `<rule_id>-cps-rule`: binds that listener to the load balancer's
//!   backend pool through the first backend HTTP settings
//!
//! Adding a pair whose names already exist replaces the existing entries, so
//! names stay unique no matter how often a rule is published.

use super::naming::{backend_pool_id, id_prefix, listener_id, listener_name, pool_name, rule_name};
use super::types::{
    remove_named, upsert_named, ApplicationGateway, HttpListener, HttpListenerProperties,
    Reference, RequestRoutingRule, RequestRoutingRuleProperties,
};
use crate::constants::{HTTP_FRONTEND_PORT, LISTENER_PROTOCOL_HTTP, RULE_TYPE_BASIC};
use crate::errors::GatewayError;
use tracing::debug;

/// ID of the frontend port listening on port 80, if the gateway has one.
#[must_use]
pub fn frontend_port_id(gateway: &ApplicationGateway) -> Option<&str> {
    gateway
        .properties
        .frontend_ports
        .iter()
        .find(|port| port.properties.port == Some(HTTP_FRONTEND_PORT))
        .and_then(|port| port.id.as_deref())
}

/// Add (or replace) the HTTP listener for `rule_id`.
///
/// # Errors
///
/// Returns [`GatewayError::MissingFrontendIpConfiguration`] when the gateway
/// has no frontend IP configuration to bind to.
pub fn add_listener(
    gateway: &mut ApplicationGateway,
    rule_id: &str,
    hostname: &str,
    port_id: &str,
) -> Result<(), GatewayError> {
    let ip_config_id = gateway
        .properties
        .frontend_ip_configurations
        .first()
        .and_then(|ip| ip.id.clone())
        .ok_or_else(|| GatewayError::MissingFrontendIpConfiguration {
            gateway: gateway.gateway_name().to_string(),
        })?;

    let name = listener_name(rule_id);
    debug!(listener = %name, hostname, "Adding HTTP listener");

    upsert_named(
        &mut gateway.properties.http_listeners,
        HttpListener {
            name: Some(name),
            properties: HttpListenerProperties {
                protocol: Some(LISTENER_PROTOCOL_HTTP.to_string()),
                host_name: Some(hostname.to_string()),
                frontend_ip_configuration: Some(Reference::new(ip_config_id)),
                frontend_port: Some(Reference::new(port_id)),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    Ok(())
}

/// Add (or replace) the request routing rule for `rule_id`.
///
/// # Errors
///
/// Returns [`GatewayError::MissingBackendHttpSettings`] when the gateway has no
/// backend HTTP settings to reference.
pub fn add_routing_rule(
    gateway: &mut ApplicationGateway,
    rule_id: &str,
    backend_pool_id: &str,
    listener_id: &str,
) -> Result<(), GatewayError> {
    let settings_id = gateway
        .properties
        .backend_http_settings_collection
        .first()
        .and_then(|settings| settings.id.clone())
        .ok_or_else(|| GatewayError::MissingBackendHttpSettings {
            gateway: gateway.gateway_name().to_string(),
        })?;

    let name = rule_name(rule_id);
    debug!(rule = %name, backend_pool_id, listener_id, "Adding request routing rule");

    upsert_named(
        &mut gateway.properties.request_routing_rules,
        RequestRoutingRule {
            name: Some(name),
            properties: RequestRoutingRuleProperties {
                rule_type: Some(RULE_TYPE_BASIC.to_string()),
                backend_address_pool: Some(Reference::new(backend_pool_id)),
                backend_http_settings: Some(Reference::new(settings_id)),
                http_listener: Some(Reference::new(listener_id)),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    Ok(())
}

/// Publish one hostname route: listener plus routing rule to the load balancer's pool.
///
/// All preconditions are checked before the gateway is touched, so on error
/// the snapshot is left exactly as it was.
///
/// # Errors
///
/// - [`GatewayError::NoHttpFrontendPort`] if no frontend port uses port 80
/// - [`GatewayError::MissingFrontendIpConfiguration`] /
///   [`GatewayError::MissingBackendHttpSettings`] if the gateway lacks them
pub fn add_rule(
    gateway: &mut ApplicationGateway,
    load_balancer_id: &str,
    rule_id: &str,
    hostname: &str,
) -> Result<(), GatewayError> {
    let gateway_name = gateway.gateway_name().to_string();

    let port_id = frontend_port_id(gateway)
        .ok_or_else(|| GatewayError::NoHttpFrontendPort {
            gateway: gateway_name.clone(),
        })?
        .to_string();
    if gateway
        .properties
        .backend_http_settings_collection
        .first()
        .and_then(|settings| settings.id.as_ref())
        .is_none()
    {
        return Err(GatewayError::MissingBackendHttpSettings {
            gateway: gateway_name,
        });
    }

    let prefix = id_prefix(&port_id, &gateway_name);
    let backend_id = backend_pool_id(prefix, &pool_name(load_balancer_id));
    let listener_ref = listener_id(prefix, &listener_name(rule_id));

    add_listener(gateway, rule_id, hostname, &port_id)?;
    add_routing_rule(gateway, rule_id, &backend_id, &listener_ref)
}

/// Remove the routing rule and listener for `rule_id`.
///
/// Each removal is independent and silently ignores a missing entry.
pub fn remove_rule(gateway: &mut ApplicationGateway, rule_id: &str) {
    let rules = remove_named(
        &mut gateway.properties.request_routing_rules,
        &rule_name(rule_id),
    );
    let listeners = remove_named(
        &mut gateway.properties.http_listeners,
        &listener_name(rule_id),
    );
    debug!(rule_id, rules, listeners, "Removed routing rule and listener");
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod rules_tests;
