// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for Application Gateway reconciliation.
//!
//! This module provides the error taxonomy shared by the in-memory mutation
//! helpers, the reconciler entrypoints, and the ARM transport:
//! - Missing or unconfigured gateways
//! - Transport and control-plane failures
//! - Optimistic-concurrency conflicts on apply
//! - Malformed rule status records
//! - Gateways lacking a sub-resource the reconciler depends on
//!
//! Removing or replacing a pool, listener, or rule that does not exist is
//! never an error; those operations are silent no-ops.

use thiserror::Error;

/// Errors that can occur while fetching, mutating, or applying a gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway is required but not configured, or does not exist remotely.
    ///
    /// Returned by entrypoints that can only mutate an existing gateway.
    #[error("Application gateway '{name}' in resource group '{group}' is not configured or does not exist")]
    ConfigurationAbsent {
        /// Resource group of the gateway
        group: String,
        /// Gateway name (may be empty when unconfigured)
        name: String,
    },

    /// The control plane reported the gateway as not found (HTTP 404)
    #[error("Application gateway '{name}' not found in resource group '{group}' (HTTP 404)")]
    NotFound {
        /// Resource group of the gateway
        group: String,
        /// Gateway name
        name: String,
    },

    /// The apply was rejected because the gateway changed since it was fetched (HTTP 412)
    ///
    /// The caller should re-run the whole reconciliation against a fresh snapshot.
    #[error("Application gateway '{name}' in resource group '{group}' was modified concurrently (etag mismatch)")]
    Conflict {
        /// Resource group of the gateway
        group: String,
        /// Gateway name
        name: String,
    },

    /// The control plane answered with an unexpected HTTP status
    #[error("Control plane returned HTTP {status} for gateway '{name}' in resource group '{group}': {message}")]
    HttpStatus {
        /// Resource group of the gateway
        group: String,
        /// Gateway name
        name: String,
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },

    /// Network-level failure (connection refused, timeout, reset)
    #[error("Transport failure for gateway '{name}' in resource group '{group}': {reason}")]
    Transport {
        /// Resource group of the gateway
        group: String,
        /// Gateway name
        name: String,
        /// Reason for the failure
        reason: String,
    },

    /// The control plane accepted the call but its body is not a gateway document
    ///
    /// Never retried: for a write the change has already been applied, and
    /// resending it with the old etag would report a false conflict.
    #[error("Invalid gateway document from control plane for '{name}' in resource group '{group}': {reason}")]
    InvalidResponse {
        /// Resource group of the gateway
        group: String,
        /// Gateway name
        name: String,
        /// Decoder error message
        reason: String,
    },

    /// The serialized rule status record could not be parsed
    #[error("Malformed rule status record: {reason}")]
    MalformedStatusRecord {
        /// Parser error message
        reason: String,
    },

    /// No frontend port with port number 80 exists on the gateway
    #[error("Application gateway '{gateway}' has no HTTP frontend port (port 80)")]
    NoHttpFrontendPort {
        /// Gateway name
        gateway: String,
    },

    /// The gateway has no frontend IP configuration to bind a listener to
    #[error("Application gateway '{gateway}' has no frontend IP configuration")]
    MissingFrontendIpConfiguration {
        /// Gateway name
        gateway: String,
    },

    /// The gateway has no backend HTTP settings to reference from a rule
    #[error("Application gateway '{gateway}' has no backend HTTP settings")]
    MissingBackendHttpSettings {
        /// Gateway name
        gateway: String,
    },
}

impl GatewayError {
    /// Returns true if re-running the reconciliation may succeed without operator action.
    ///
    /// Conflicts and transport failures are transient. Everything else needs a
    /// configuration change first.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Conflict { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            Self::ConfigurationAbsent { .. }
            | Self::NotFound { .. }
            | Self::InvalidResponse { .. }
            | Self::MalformedStatusRecord { .. }
            | Self::NoHttpFrontendPort { .. }
            | Self::MissingFrontendIpConfiguration { .. }
            | Self::MissingBackendHttpSettings { .. } => false,
        }
    }

    /// Returns a CamelCase reason suitable for a status annotation or metric label.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConfigurationAbsent { .. } | Self::NotFound { .. } => "ConfigurationAbsent",
            Self::Conflict { .. } => "Conflict",
            Self::HttpStatus { .. } | Self::Transport { .. } => "TransportFailure",
            Self::InvalidResponse { .. } => "InvalidResponse",
            Self::MalformedStatusRecord { .. } => "MalformedStatusRecord",
            Self::NoHttpFrontendPort { .. } => "NoHttpFrontendPort",
            Self::MissingFrontendIpConfiguration { .. } => "MissingFrontendIpConfiguration",
            Self::MissingBackendHttpSettings { .. } => "MissingBackendHttpSettings",
        }
    }
}
