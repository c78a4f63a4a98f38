// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # appgw-sync - Azure Application Gateway reconciler
//!
//! Keeps an Azure Application Gateway in step with a set of load balancers:
//! one backend pool per load balancer, and one HTTP listener plus one basic
//! routing rule per hostname route.
//!
//! ## Overview
//!
//! The gateway is a single document. Every operation fetches it, mutates the
//! snapshot in memory, and writes it back exactly once. Names are derived
//! deterministically from load balancer and rule identifiers, so repeated
//! reconciliations converge on the same document.
//!
//! ## Modules
//!
//! - [`gateway`] - Gateway model, mutation helpers, and the reconciler
//! - [`ingress`] - Routing intents sourced from Kubernetes Ingresses
//! - [`config`] - CLI and environment configuration
//! - [`errors`] - Typed reconciliation errors
//! - [`http_errors`] - ARM HTTP status mapping
//! - [`retry`] - Exponential backoff for remote calls
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use appgw_sync::gateway::{
//!     ArmGatewayClient, BackendAddress, GatewayReconciler, GatewayTarget, RoutingIntent,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ArmGatewayClient::new("subscription-id", "bearer-token")?;
//! let reconciler = GatewayReconciler::new(client);
//! let target = GatewayTarget::new("my-rg", "my-gateway");
//!
//! reconciler
//!     .sync_backend_pool(
//!         &target,
//!         "lb1",
//!         vec![BackendAddress::ip("10.0.0.4")],
//!         Some(&[RoutingIntent::new("web", "web.example.com")]),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod gateway;
pub mod http_errors;
pub mod ingress;
pub mod metrics;
pub mod retry;
