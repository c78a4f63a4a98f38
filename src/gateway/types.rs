// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Application Gateway document model.
//!
//! The shape follows the Azure Resource Manager JSON representation
//! (`id`, `name`, `etag`, `properties.{...}`). Only the fields the reconciler
//! reads or writes are typed; everything else is captured in flattened `extra`
//! maps so a fetched document survives the full-snapshot apply unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;

/// Lookup by resource name within a sub-resource collection.
pub trait Named {
    /// Resource name, if the control plane returned one.
    fn name(&self) -> Option<&str>;
}

macro_rules! impl_named {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Named for $ty {
                fn name(&self) -> Option<&str> {
                    self.name.as_deref()
                }
            }
        )+
    };
}

impl_named!(
    FrontendPort,
    NamedResource,
    BackendAddressPool,
    HttpListener,
    RequestRoutingRule,
);

/// The full remote gateway resource, fetched and applied as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationGateway {
    /// Full ARM resource ID of the gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Gateway name, the last segment of `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optimistic-concurrency token returned by the control plane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Sub-resource collections the reconciler mutates
    #[serde(default)]
    pub properties: GatewayProperties,
    /// Top-level fields passed through untouched (`location`, `tags`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationGateway {
    /// The gateway's own name, or `""` when the document carries none.
    #[must_use]
    pub fn gateway_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn backend_pool(&self, name: &str) -> Option<&BackendAddressPool> {
        find_named(&self.properties.backend_address_pools, name)
    }

    #[must_use]
    pub fn http_listener(&self, name: &str) -> Option<&HttpListener> {
        find_named(&self.properties.http_listeners, name)
    }

    #[must_use]
    pub fn routing_rule(&self, name: &str) -> Option<&RequestRoutingRule> {
        find_named(&self.properties.request_routing_rules, name)
    }
}

/// Gateway properties the reconciler works with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayProperties {
    /// Frontend ports; the one on port 80 anchors listeners and resource IDs
    #[serde(default)]
    pub frontend_ports: Vec<FrontendPort>,
    /// Frontend IP configurations; listeners bind to the first
    #[serde(default, rename = "frontendIPConfigurations")]
    pub frontend_ip_configurations: Vec<NamedResource>,
    /// Backend HTTP settings; rules reference the first
    #[serde(default)]
    pub backend_http_settings_collection: Vec<NamedResource>,
    /// Backend pools, one per load balancer plus any unmanaged ones
    #[serde(default)]
    pub backend_address_pools: Vec<BackendAddressPool>,
    /// HTTP listeners, one per published rule plus any unmanaged ones
    #[serde(default)]
    pub http_listeners: Vec<HttpListener>,
    /// Request routing rules tying a listener to a pool
    #[serde(default)]
    pub request_routing_rules: Vec<RequestRoutingRule>,
    /// Remaining properties (`sku`, `provisioningState`, probes, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to another sub-resource by ID (ARM `SubResource`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Resource ID of the referenced sub-resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

/// A sub-resource whose properties the reconciler never inspects
/// (frontend IP configurations, backend HTTP settings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A port the gateway listens on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: FrontendPortProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendPortProperties {
    /// Port number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Set of backend nodes traffic is forwarded to.
///
/// Pools owned by the reconciler are named `<load-balancer>-backendpool`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendAddressPool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: BackendAddressPoolProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddressPoolProperties {
    /// Pool members, in the order they were supplied
    #[serde(default)]
    pub backend_addresses: Vec<BackendAddress>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One backend node, addressed by IP or FQDN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddress {
    /// IPv4 or IPv6 literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Fully qualified domain name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

impl BackendAddress {
    pub fn ip(addr: impl Into<String>) -> Self {
        Self {
            ip_address: Some(addr.into()),
            fqdn: None,
        }
    }

    pub fn fqdn(host: impl Into<String>) -> Self {
        Self {
            ip_address: None,
            fqdn: Some(host.into()),
        }
    }

    /// IP literal when `value` parses as one, FQDN otherwise.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.parse::<IpAddr>().is_ok() {
            Self::ip(value)
        } else {
            Self::fqdn(value)
        }
    }
}

/// Plain-HTTP listener matching one hostname on the port-80 frontend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpListener {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: HttpListenerProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpListenerProperties {
    /// Always `Http` for listeners the reconciler creates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Host header the listener matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Frontend IP configuration the listener binds to
    #[serde(
        default,
        rename = "frontendIPConfiguration",
        skip_serializing_if = "Option::is_none"
    )]
    pub frontend_ip_configuration: Option<Reference>,
    /// Frontend port the listener binds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_port: Option<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Basic routing rule sending one listener's traffic to one pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRoutingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: RequestRoutingRuleProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRoutingRuleProperties {
    /// Always `Basic` for rules the reconciler creates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    /// Target pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_address_pool: Option<Reference>,
    /// Backend HTTP settings applied to forwarded requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_http_settings: Option<Reference>,
    /// Listener whose traffic the rule routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_listener: Option<Reference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Desired hostname route, keyed by a rule identifier that is stable across
/// reconciliations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingIntent {
    /// Stable identifier; listener and rule names derive from it
    pub rule_id: String,
    /// Hostname the listener matches
    pub hostname: String,
}

impl RoutingIntent {
    pub fn new(rule_id: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            hostname: hostname.into(),
        }
    }
}

pub(crate) fn find_named<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == Some(name))
}

/// Replace the entry named like `item`, or append it when absent.
///
/// Any later duplicates of the same name are dropped so names stay unique.
pub(crate) fn upsert_named<T: Named>(items: &mut Vec<T>, item: T) {
    let name = item.name().map(str::to_string);
    let Some(pos) = items.iter().position(|i| i.name() == name.as_deref()) else {
        items.push(item);
        return;
    };

    items[pos] = item;
    let mut idx = 0;
    items.retain(|i| {
        let keep = idx <= pos || i.name() != name.as_deref();
        idx += 1;
        keep
    });
}

/// Drop every entry called `name`. Returns how many were removed.
pub(crate) fn remove_named<T: Named>(items: &mut Vec<T>, name: &str) -> usize {
    let before = items.len();
    items.retain(|item| item.name() != Some(name));
    before - items.len()
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
