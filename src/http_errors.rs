// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP status mapping for Azure Resource Manager responses.
//!
//! ARM answers gateway reads and writes with a small set of meaningful status
//! codes. This module turns them into [`GatewayError`] values so the reconciler
//! can tell "not found" and "modified concurrently" apart from generic failures.
//!
//! # Usage
//!
//! ```rust
//! use appgw_sync::errors::GatewayError;
//! use appgw_sync::http_errors::map_arm_status;
//!
//! let err = map_arm_status(404, "rg", "agw", "");
//! assert!(matches!(err, GatewayError::NotFound { .. }));
//!
//! let err = map_arm_status(412, "rg", "agw", "");
//! assert!(matches!(err, GatewayError::Conflict { .. }));
//! ```

use crate::errors::GatewayError;

/// Map a non-success ARM HTTP status code to a [`GatewayError`].
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Error | Meaning |
/// |-----------|-------|---------|
/// | 404 | `NotFound` | Gateway does not exist |
/// | 409 | `Conflict` | Another operation is in progress on the gateway |
/// | 412 | `Conflict` | `If-Match` etag no longer matches |
/// | Other | `HttpStatus` | Passed through with the response body |
#[must_use]
pub fn map_arm_status(status_code: u16, group: &str, name: &str, body: &str) -> GatewayError {
    match status_code {
        404 => GatewayError::NotFound {
            group: group.to_string(),
            name: name.to_string(),
        },
        409 | 412 => GatewayError::Conflict {
            group: group.to_string(),
            name: name.to_string(),
        },
        _ => GatewayError::HttpStatus {
            group: group.to_string(),
            name: name.to_string(),
            status: status_code,
            message: summarize_body(body),
        },
    }
}

/// Map a reqwest error that happened before any status code was received.
#[must_use]
pub fn map_connection_error(err: &reqwest::Error, group: &str, name: &str) -> GatewayError {
    let reason = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };

    GatewayError::Transport {
        group: group.to_string(),
        name: name.to_string(),
        reason,
    }
}

/// Extract the `error.message` field of an ARM error body, falling back to the raw text.
fn summarize_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
#[path = "http_errors_tests.rs"]
mod http_errors_tests;
