// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Application Gateway reconciliation.
//!
//! Every entrypoint on [`GatewayReconciler`] follows the same shape: fetch the
//! whole gateway document, mutate the in-memory snapshot, and apply it back
//! exactly once. Mutation is pure and synchronous; the only awaits are the
//! fetch and the apply.
//!
//! ## Module Structure
//!
//! - [`types`] - Gateway document model (ARM JSON)
//! - [`naming`] - Deterministic names and resource IDs
//! - [`pool`] - Backend pool add/replace/remove
//! - [`rules`] - Listener and routing rule add/remove
//! - [`sync`] - Bulk rule add/remove and status record parsing
//! - [`client`] - [`GatewayClient`] seam and the ARM implementation

pub mod client;
pub mod naming;
pub mod pool;
pub mod rules;
pub mod sync;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use client::{ArmGatewayClient, GatewayClient};
pub use types::{ApplicationGateway, BackendAddress, RoutingIntent};

use crate::constants::{
    OP_DELETE_POOL, OP_PUBLISH_RULE, OP_REFRESH_POOL, OP_SYNC_POOL, OP_WITHDRAW_RULE,
};
use crate::errors::GatewayError;
use crate::metrics::{
    record_gateway_apply, record_reconciliation_error, record_reconciliation_skipped,
    record_reconciliation_success,
};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Resource group and name of the gateway a reconciliation targets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GatewayTarget {
    pub resource_group: String,
    /// May be empty when no gateway is configured for the load balancer.
    pub gateway_name: String,
}

impl GatewayTarget {
    #[must_use]
    pub fn new(resource_group: impl Into<String>, gateway_name: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            gateway_name: gateway_name.into(),
        }
    }

    fn absent(&self) -> GatewayError {
        GatewayError::ConfigurationAbsent {
            group: self.resource_group.clone(),
            name: self.gateway_name.clone(),
        }
    }
}

/// What a reconciliation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The mutated snapshot was applied. Carries the etag returned by the apply.
    Applied { etag: Option<String> },
    /// No gateway is configured; nothing was fetched or applied.
    Skipped,
    /// The load balancer has no backend pool on the gateway; nothing was applied.
    PoolMissing,
}

impl ReconcileOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Drives fetch, mutate, and apply against a [`GatewayClient`].
///
/// The reconciler keeps no state between calls. Concurrent reconciliations
/// against the same gateway are guarded by the etag carried on each snapshot:
/// the loser gets [`GatewayError::Conflict`] and must run again.
#[derive(Debug, Clone)]
pub struct GatewayReconciler<C> {
    client: C,
}

impl<C: GatewayClient> GatewayReconciler<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the gateway snapshot.
    ///
    /// An empty gateway name, or a gateway the control plane does not know,
    /// yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Any transport or control-plane failure other than not-found.
    pub async fn fetch(
        &self,
        target: &GatewayTarget,
    ) -> Result<Option<ApplicationGateway>, GatewayError> {
        if target.gateway_name.is_empty() {
            debug!(
                resource_group = %target.resource_group,
                "No application gateway configured"
            );
            return Ok(None);
        }

        match self
            .client
            .get(&target.resource_group, &target.gateway_name)
            .await
        {
            Ok(gateway) => Ok(Some(gateway)),
            Err(GatewayError::NotFound { .. }) => {
                warn!(
                    resource_group = %target.resource_group,
                    gateway = %target.gateway_name,
                    "Application gateway not found"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create path: install the load balancer's backend pool and publish the
    /// rules for any intents whose listener is not on the gateway yet.
    ///
    /// Skips without applying when no gateway is configured.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigurationAbsent`] when a configured gateway does not
    /// exist, a sub-resource error from [`rules::add_rule`], or the apply error.
    pub async fn sync_backend_pool(
        &self,
        target: &GatewayTarget,
        load_balancer_id: &str,
        addresses: Vec<BackendAddress>,
        intents: Option<&[RoutingIntent]>,
    ) -> Result<ReconcileOutcome, GatewayError> {
        instrumented(OP_SYNC_POOL, async {
            if target.gateway_name.is_empty() {
                info!(load_balancer = load_balancer_id, "No gateway configured, skipping pool sync");
                return Ok(ReconcileOutcome::Skipped);
            }
            let mut gateway = self.fetch(target).await?.ok_or_else(|| target.absent())?;

            pool::add_or_replace_pool(&mut gateway, load_balancer_id, addresses);
            if let Some(intents) = intents {
                let selected = sync::filter_listeners_by_owner(&gateway, intents);
                sync::add_all_rules(&mut gateway, load_balancer_id, &selected)?;
            }

            self.apply(target, OP_SYNC_POOL, &gateway).await
        })
        .await
    }

    /// Delete path: remove the load balancer's backend pool and every rule the
    /// status record marks as published.
    ///
    /// The status record is parsed before anything is fetched.
    ///
    /// # Errors
    ///
    /// [`GatewayError::MalformedStatusRecord`] for an unparsable record,
    /// [`GatewayError::ConfigurationAbsent`] when a configured gateway does not
    /// exist, or the apply error.
    pub async fn delete_backend_pool(
        &self,
        target: &GatewayTarget,
        load_balancer_id: &str,
        rule_status: Option<&str>,
    ) -> Result<ReconcileOutcome, GatewayError> {
        instrumented(OP_DELETE_POOL, async {
            let statuses = rule_status
                .map(sync::parse_rule_status)
                .transpose()?
                .unwrap_or_default();

            if target.gateway_name.is_empty() {
                info!(load_balancer = load_balancer_id, "No gateway configured, skipping pool delete");
                return Ok(ReconcileOutcome::Skipped);
            }
            let mut gateway = self.fetch(target).await?.ok_or_else(|| target.absent())?;

            pool::remove_pool(&mut gateway, load_balancer_id);
            let removed = sync::remove_all_rules(&mut gateway, &statuses);
            debug!(load_balancer = load_balancer_id, rules = ?removed, "Withdrawn published rules");

            self.apply(target, OP_DELETE_POOL, &gateway).await
        })
        .await
    }

    /// Replace the membership of an existing backend pool.
    ///
    /// Returns [`ReconcileOutcome::PoolMissing`] without applying when the load
    /// balancer has no pool on the gateway.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigurationAbsent`] when the gateway name is empty or
    /// the gateway does not exist, or the apply error.
    pub async fn refresh_pool_members(
        &self,
        target: &GatewayTarget,
        load_balancer_id: &str,
        addresses: Vec<BackendAddress>,
    ) -> Result<ReconcileOutcome, GatewayError> {
        instrumented(OP_REFRESH_POOL, async {
            let mut gateway = self.fetch(target).await?.ok_or_else(|| target.absent())?;

            if !pool::replace_pool_addresses(&mut gateway, load_balancer_id, addresses) {
                info!(
                    load_balancer = load_balancer_id,
                    gateway = %target.gateway_name,
                    "Backend pool not found, nothing to refresh"
                );
                return Ok(ReconcileOutcome::PoolMissing);
            }

            self.apply(target, OP_REFRESH_POOL, &gateway).await
        })
        .await
    }

    /// Publish a single routing rule for `intent` on the load balancer's pool.
    ///
    /// Returns [`ReconcileOutcome::PoolMissing`] without applying when the load
    /// balancer has no pool on the gateway.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigurationAbsent`] when the gateway is missing, a
    /// sub-resource error from [`rules::add_rule`], or the apply error.
    pub async fn publish_rule(
        &self,
        target: &GatewayTarget,
        load_balancer_id: &str,
        intent: &RoutingIntent,
    ) -> Result<ReconcileOutcome, GatewayError> {
        instrumented(OP_PUBLISH_RULE, async {
            let mut gateway = self.fetch(target).await?.ok_or_else(|| target.absent())?;

            if gateway
                .backend_pool(&naming::pool_name(load_balancer_id))
                .is_none()
            {
                info!(
                    load_balancer = load_balancer_id,
                    rule = %intent.rule_id,
                    gateway = %target.gateway_name,
                    "Backend pool not found, rule not published"
                );
                return Ok(ReconcileOutcome::PoolMissing);
            }

            rules::add_rule(
                &mut gateway,
                load_balancer_id,
                &intent.rule_id,
                &intent.hostname,
            )?;
            self.apply(target, OP_PUBLISH_RULE, &gateway).await
        })
        .await
    }

    /// Withdraw a single routing rule and its listener.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ConfigurationAbsent`] when the gateway is missing, or the
    /// apply error.
    pub async fn withdraw_rule(
        &self,
        target: &GatewayTarget,
        rule_id: &str,
    ) -> Result<ReconcileOutcome, GatewayError> {
        instrumented(OP_WITHDRAW_RULE, async {
            let mut gateway = self.fetch(target).await?.ok_or_else(|| target.absent())?;
            rules::remove_rule(&mut gateway, rule_id);
            self.apply(target, OP_WITHDRAW_RULE, &gateway).await
        })
        .await
    }

    async fn apply(
        &self,
        target: &GatewayTarget,
        operation: &str,
        gateway: &ApplicationGateway,
    ) -> Result<ReconcileOutcome, GatewayError> {
        let updated = self
            .client
            .create_or_update(&target.resource_group, &target.gateway_name, gateway)
            .await?;
        record_gateway_apply(operation);
        info!(
            resource_group = %target.resource_group,
            gateway = %target.gateway_name,
            operation,
            "Applied gateway snapshot"
        );
        Ok(ReconcileOutcome::Applied {
            etag: updated.etag,
        })
    }
}

/// Time a reconciliation and record its result.
async fn instrumented<F>(operation: &str, reconcile: F) -> Result<ReconcileOutcome, GatewayError>
where
    F: Future<Output = Result<ReconcileOutcome, GatewayError>>,
{
    let start = Instant::now();
    let result = reconcile.await;
    match &result {
        Ok(ReconcileOutcome::Applied { .. }) => {
            record_reconciliation_success(operation, start.elapsed());
        }
        Ok(_) => record_reconciliation_skipped(operation),
        Err(e) => {
            warn!(operation, reason = e.reason(), error = %e, "Reconciliation failed");
            record_reconciliation_error(operation, e.reason(), start.elapsed());
        }
    }
    result
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
