// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Backend pool management.
//!
//! Each load balancer owns exactly one pool named `<load_balancer_id>-backendpool`.
//! Addresses are always replaced wholesale: the caller passes the complete
//! desired membership, never a delta.

use super::naming::pool_name;
use super::types::{
    remove_named, ApplicationGateway, BackendAddress, BackendAddressPool,
    BackendAddressPoolProperties,
};
use tracing::debug;

/// Set the load balancer's pool to exactly `addresses`, creating it if needed.
///
/// An existing pool keeps its other properties; only its address list changes.
pub fn add_or_replace_pool(
    gateway: &mut ApplicationGateway,
    load_balancer_id: &str,
    addresses: Vec<BackendAddress>,
) {
    let name = pool_name(load_balancer_id);
    let pools = &mut gateway.properties.backend_address_pools;

    if let Some(pool) = pools
        .iter_mut()
        .find(|pool| pool.name.as_deref() == Some(name.as_str()))
    {
        debug!(pool = %name, count = addresses.len(), "Replacing backend pool addresses");
        pool.properties.backend_addresses = addresses;
        return;
    }

    debug!(pool = %name, count = addresses.len(), "Appending backend pool");
    pools.push(BackendAddressPool {
        name: Some(name),
        properties: BackendAddressPoolProperties {
            backend_addresses: addresses,
            ..Default::default()
        },
        ..Default::default()
    });
}

/// Remove the load balancer's pool. Missing pools are ignored.
pub fn remove_pool(gateway: &mut ApplicationGateway, load_balancer_id: &str) {
    let name = pool_name(load_balancer_id);
    let removed = remove_named(&mut gateway.properties.backend_address_pools, &name);
    debug!(pool = %name, removed, "Removed backend pool");
}

/// Replace the addresses of the load balancer's pool if it exists.
///
/// Returns `false`, leaving the gateway untouched, when there is no such pool.
pub fn replace_pool_addresses(
    gateway: &mut ApplicationGateway,
    load_balancer_id: &str,
    addresses: Vec<BackendAddress>,
) -> bool {
    let name = pool_name(load_balancer_id);

    let Some(pool) = gateway
        .properties
        .backend_address_pools
        .iter_mut()
        .find(|pool| pool.name.as_deref() == Some(name.as_str()))
    else {
        return false;
    };

    debug!(pool = %name, count = addresses.len(), "Replacing backend pool addresses");
    pool.properties.backend_addresses = addresses;
    true
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod pool_tests;
