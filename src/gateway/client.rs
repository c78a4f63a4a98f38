// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Transport seam between the reconciler and the cloud control plane.
//!
//! The reconciler only needs two calls: read the whole gateway document and
//! write the whole document back. [`GatewayClient`] captures that contract;
//! [`ArmGatewayClient`] implements it against the Azure Resource Manager REST
//! API.
//!
//! # Retry and concurrency
//!
//! `ArmGatewayClient` retries 429/5xx responses and connection failures under
//! [`BackoffPolicy::ARM`]. Writes carry the fetched `etag` as `If-Match`, so a write
//! based on a stale snapshot fails with [`GatewayError::Conflict`] instead of
//! silently overwriting a concurrent change. Conflicts are not retried here:
//! the whole reconciliation has to start again from a fresh fetch.

use super::types::ApplicationGateway;
use crate::constants::{
    APPLICATION_GATEWAYS_PROVIDER, DEFAULT_ARM_API_VERSION, DEFAULT_ARM_ENDPOINT,
};
use crate::errors::GatewayError;
use crate::http_errors::{map_arm_status, map_connection_error};
use crate::retry::{is_retryable_http_status, retry_with_backoff, BackoffPolicy};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::IF_MATCH;
use reqwest::{Client as HttpClient, Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Read and write access to gateway documents.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Fetch the gateway document.
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] when the gateway does not exist; any other
    /// variant for transport or control-plane failures.
    async fn get(&self, group: &str, name: &str) -> Result<ApplicationGateway, GatewayError>;

    /// Replace the gateway document with `gateway`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Conflict`] when the document changed since `gateway` was
    /// fetched; any other variant for transport or control-plane failures.
    async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        gateway: &ApplicationGateway,
    ) -> Result<ApplicationGateway, GatewayError>;
}

/// [`GatewayClient`] backed by the Azure Resource Manager REST API.
#[derive(Debug, Clone)]
pub struct ArmGatewayClient {
    http: HttpClient,
    endpoint: Url,
    subscription_id: String,
    api_version: String,
    token: Arc<String>,
    backoff: BackoffPolicy,
}

impl ArmGatewayClient {
    /// Create a client for `subscription_id` against the public Azure cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the default endpoint cannot be parsed.
    pub fn new(subscription_id: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(
            DEFAULT_ARM_ENDPOINT,
            subscription_id,
            DEFAULT_ARM_API_VERSION,
            token,
        )
    }

    /// Create a client against a specific ARM endpoint and API version.
    ///
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not an absolute http(s) URL.
    pub fn with_endpoint(
        endpoint: &str,
        subscription_id: impl Into<String>,
        api_version: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid ARM endpoint '{endpoint}'"))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("ARM endpoint '{endpoint}' cannot carry a path"));
        }

        Ok(Self {
            http: HttpClient::new(),
            endpoint,
            subscription_id: subscription_id.into(),
            api_version: api_version.into(),
            token: Arc::new(token.into()),
            backoff: BackoffPolicy::ARM,
        })
    }

    /// Override the retry schedule used for every request.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Full resource URL of a gateway, including the `api-version` query.
    #[must_use]
    pub fn gateway_url(&self, group: &str, name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(
                [
                    "subscriptions",
                    self.subscription_id.as_str(),
                    "resourceGroups",
                    group,
                ]
                .into_iter()
                .chain(APPLICATION_GATEWAYS_PROVIDER.split('/'))
                .chain(std::iter::once(name)),
            );
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("api-version", &self.api_version);
        url
    }

    async fn send_once(
        &self,
        method: Method,
        group: &str,
        name: &str,
        body: Option<&ApplicationGateway>,
    ) -> Result<ApplicationGateway, GatewayError> {
        let url = self.gateway_url(group, name);
        debug!(method = %method, url = %url, "ARM request");

        let mut request = self.http.request(method, url);
        if !self.token.is_empty() {
            request = request.bearer_auth(self.token.as_str());
        }
        if let Some(gateway) = body {
            if let Some(etag) = gateway.etag.as_deref() {
                request = request.header(IF_MATCH, etag);
            }
            request = request.json(gateway);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_connection_error(&e, group, name))?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_arm_status(status.as_u16(), group, name, &text));
        }

        response
            .json::<ApplicationGateway>()
            .await
            .map_err(|e| GatewayError::InvalidResponse {
                group: group.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn send(
        &self,
        method: Method,
        group: &str,
        name: &str,
        body: Option<&ApplicationGateway>,
    ) -> Result<ApplicationGateway, GatewayError> {
        let operation = format!("{method} {group}/{name}");

        retry_with_backoff(self.backoff, &operation, is_retryable_transport_error, || {
            self.send_once(method.clone(), group, name, body)
        })
        .await
    }
}

/// Only failures the control plane may recover from on its own are retried.
///
/// A 2xx with an undecodable body is final: a write has already landed.
fn is_retryable_transport_error(err: &GatewayError) -> bool {
    match err {
        GatewayError::Transport { .. } => true,
        GatewayError::HttpStatus { status, .. } => StatusCode::from_u16(*status)
            .map(is_retryable_http_status)
            .unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl GatewayClient for ArmGatewayClient {
    async fn get(&self, group: &str, name: &str) -> Result<ApplicationGateway, GatewayError> {
        self.send(Method::GET, group, name, None).await
    }

    async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        gateway: &ApplicationGateway,
    ) -> Result<ApplicationGateway, GatewayError> {
        let updated = self.send(Method::PUT, group, name, Some(gateway)).await?;
        info!(
            resource_group = group,
            gateway = name,
            etag = updated.etag.as_deref().unwrap_or_default(),
            "Application gateway update accepted"
        );
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
