// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared gateway snapshots for unit tests.

use super::types::{
    ApplicationGateway, BackendAddress, BackendAddressPool, BackendAddressPoolProperties,
    FrontendPort, FrontendPortProperties, GatewayProperties, HttpListener,
    HttpListenerProperties, NamedResource, Reference, RequestRoutingRule,
    RequestRoutingRuleProperties,
};

pub(crate) const GATEWAY_NAME: &str = "agw";

pub(crate) const GATEWAY_ID: &str =
    "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/applicationGateways/agw";

pub(crate) fn port_id(name: &str) -> String {
    format!("{GATEWAY_ID}/frontendPorts/{name}")
}

pub(crate) fn ip_config_id() -> String {
    format!("{GATEWAY_ID}/frontendIPConfigurations/ip1")
}

pub(crate) fn http_settings_id() -> String {
    format!("{GATEWAY_ID}/backendHttpSettingsCollection/s1")
}

fn frontend_port(name: &str, port: i32) -> FrontendPort {
    FrontendPort {
        id: Some(port_id(name)),
        name: Some(name.to_string()),
        properties: FrontendPortProperties {
            port: Some(port),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Gateway with an HTTPS port listed before the port-80 entry `p1`, one IP
/// configuration, one HTTP setting, and a hand-made pool/listener/rule that
/// the reconciler does not own.
pub(crate) fn sample_gateway() -> ApplicationGateway {
    ApplicationGateway {
        id: Some(GATEWAY_ID.to_string()),
        name: Some(GATEWAY_NAME.to_string()),
        etag: Some("W/\"etag-1\"".to_string()),
        properties: GatewayProperties {
            frontend_ports: vec![frontend_port("p443", 443), frontend_port("p1", 80)],
            frontend_ip_configurations: vec![NamedResource {
                id: Some(ip_config_id()),
                name: Some("ip1".to_string()),
                ..Default::default()
            }],
            backend_http_settings_collection: vec![NamedResource {
                id: Some(http_settings_id()),
                name: Some("s1".to_string()),
                ..Default::default()
            }],
            backend_address_pools: vec![BackendAddressPool {
                id: Some(format!("{GATEWAY_ID}/backendAddressPools/manual")),
                name: Some("manual".to_string()),
                properties: BackendAddressPoolProperties {
                    backend_addresses: vec![BackendAddress::ip("192.168.0.10")],
                    ..Default::default()
                },
                ..Default::default()
            }],
            http_listeners: vec![HttpListener {
                name: Some("manual-listener".to_string()),
                properties: HttpListenerProperties {
                    protocol: Some("Http".to_string()),
                    host_name: Some("manual.example.com".to_string()),
                    frontend_ip_configuration: Some(Reference::new(ip_config_id())),
                    frontend_port: Some(Reference::new(port_id("p1"))),
                    ..Default::default()
                },
                ..Default::default()
            }],
            request_routing_rules: vec![RequestRoutingRule {
                name: Some("manual-rule".to_string()),
                properties: RequestRoutingRuleProperties {
                    rule_type: Some("Basic".to_string()),
                    backend_address_pool: Some(Reference::new(format!(
                        "{GATEWAY_ID}/backendAddressPools/manual"
                    ))),
                    backend_http_settings: Some(Reference::new(http_settings_id())),
                    http_listener: Some(Reference::new(format!(
                        "{GATEWAY_ID}/httpListeners/manual-listener"
                    ))),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn listener_names(gateway: &ApplicationGateway) -> Vec<&str> {
    gateway
        .properties
        .http_listeners
        .iter()
        .filter_map(|l| l.name.as_deref())
        .collect()
}

pub(crate) fn rule_names(gateway: &ApplicationGateway) -> Vec<&str> {
    gateway
        .properties
        .request_routing_rules
        .iter()
        .filter_map(|r| r.name.as_deref())
        .collect()
}

pub(crate) fn pool_names(gateway: &ApplicationGateway) -> Vec<&str> {
    gateway
        .properties
        .backend_address_pools
        .iter()
        .filter_map(|p| p.name.as_deref())
        .collect()
}
