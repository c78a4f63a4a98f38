// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use appgw_sync::gateway::{ArmGatewayClient, GatewayReconciler, GatewayTarget};
use appgw_sync::retry::BackoffPolicy;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const GATEWAY_PATH: &str =
    "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/applicationGateways/agw";

pub fn target() -> GatewayTarget {
    GatewayTarget::new("rg", "agw")
}

/// Reconciler wired to the mock server with a near-instant retry schedule.
pub fn reconciler_for(server: &MockServer) -> GatewayReconciler<ArmGatewayClient> {
    let client = ArmGatewayClient::with_endpoint(&server.uri(), "sub", "2018-01-01", "token")
        .expect("mock server URI is a valid endpoint")
        .with_backoff(BackoffPolicy::fixed(
            Duration::from_millis(1),
            Duration::from_secs(2),
        ));
    GatewayReconciler::new(client)
}

/// Gateway document as the control plane returns it, including fields the
/// reconciler never touches.
pub fn gateway_document() -> Value {
    json!({
        "id": GATEWAY_PATH,
        "name": "agw",
        "etag": "W/\"etag-1\"",
        "location": "westeurope",
        "tags": {"team": "edge"},
        "properties": {
            "provisioningState": "Succeeded",
            "sku": {"name": "Standard_Small", "tier": "Standard", "capacity": 2},
            "frontendIPConfigurations": [
                {"id": format!("{GATEWAY_PATH}/frontendIPConfigurations/ip1"), "name": "ip1"}
            ],
            "frontendPorts": [
                {"id": format!("{GATEWAY_PATH}/frontendPorts/https"), "name": "https", "properties": {"port": 443}},
                {"id": format!("{GATEWAY_PATH}/frontendPorts/p1"), "name": "p1", "properties": {"port": 80}}
            ],
            "backendHttpSettingsCollection": [
                {"id": format!("{GATEWAY_PATH}/backendHttpSettingsCollection/s1"), "name": "s1",
                 "properties": {"port": 80, "protocol": "Http"}}
            ],
            "backendAddressPools": [],
            "httpListeners": [],
            "requestRoutingRules": []
        }
    })
}

/// Serve `document` on GET.
pub async fn mount_get(server: &MockServer, document: Value) {
    Mock::given(method("GET"))
        .and(path(GATEWAY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

/// Accept PUTs by echoing the body back with a fresh etag.
pub async fn mount_echo_put(server: &MockServer) {
    let applies = AtomicUsize::new(0);
    Mock::given(method("PUT"))
        .and(path(GATEWAY_PATH))
        .respond_with(move |request: &Request| {
            let count = applies.fetch_add(1, Ordering::SeqCst) + 1;
            let mut body: Value = request.body_json().unwrap_or(Value::Null);
            body["etag"] = json!(format!("W/\"apply-{count}\""));
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(server)
        .await;
}

/// Bodies of every PUT the server received, in order.
pub async fn put_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == "PUT")
        .map(|request| request.body_json().unwrap_or(Value::Null))
        .collect()
}

/// Names of the objects in a `properties.<collection>` array.
pub fn names(document: &Value, collection: &str) -> Vec<String> {
    document["properties"][collection]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
