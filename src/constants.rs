// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Application Gateway reconciler.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Naming Constants
// ============================================================================

/// Suffix appended to a load balancer identifier to form its backend pool name
pub const BACKEND_POOL_SUFFIX: &str = "-backendpool";

/// Suffix appended to a rule identifier to form its HTTP listener name
pub const LISTENER_SUFFIX: &str = "-cps-listener";

/// Suffix appended to a rule identifier to form its request routing rule name
pub const ROUTING_RULE_SUFFIX: &str = "-cps-rule";

/// Path segment for backend address pool sub-resources
pub const BACKEND_POOLS_SEGMENT: &str = "/backendAddressPools/";

/// Path segment for HTTP listener sub-resources
pub const HTTP_LISTENERS_SEGMENT: &str = "/httpListeners/";

// ============================================================================
// Gateway Protocol Constants
// ============================================================================

/// Frontend port number used as the canonical HTTP frontend
pub const HTTP_FRONTEND_PORT: i32 = 80;

/// Protocol value for listeners created by the reconciler
pub const LISTENER_PROTOCOL_HTTP: &str = "Http";

/// Rule type for routing rules created by the reconciler
pub const RULE_TYPE_BASIC: &str = "Basic";

// ============================================================================
// Rule Status Constants
// ============================================================================

/// Status marker written by the status owner once a rule is live on the gateway.
///
/// Only rules carrying this exact value are eligible for bulk removal.
pub const RULE_STATUS_SUCCESS: &str = "Success";

// ============================================================================
// Azure Resource Manager Constants
// ============================================================================

/// Default ARM endpoint for the public Azure cloud
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Network API version matching the gateway document shape used here
pub const DEFAULT_ARM_API_VERSION: &str = "2018-01-01";

/// ARM resource provider path for application gateways
pub const APPLICATION_GATEWAYS_PROVIDER: &str = "providers/Microsoft.Network/applicationGateways";

// ============================================================================
// Metrics Operation Labels
// ============================================================================

/// Operation label for the create path (pool + missing rules)
pub const OP_SYNC_POOL: &str = "sync_pool";

/// Operation label for the delete path (pool + published rules)
pub const OP_DELETE_POOL: &str = "delete_pool";

/// Operation label for pool membership refresh
pub const OP_REFRESH_POOL: &str = "refresh_pool";

/// Operation label for publishing a single rule
pub const OP_PUBLISH_RULE: &str = "publish_rule";

/// Operation label for withdrawing a single rule
pub const OP_WITHDRAW_RULE: &str = "withdraw_rule";

// ============================================================================
// Kubernetes API Constants
// ============================================================================

/// Page size for Kubernetes list operations
pub const KUBE_LIST_PAGE_SIZE: u32 = 100;
