// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the reconciliation entrypoints, against an in-memory control plane.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::gateway::fixtures::{listener_names, pool_names, rule_names, sample_gateway};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory gateway store with etag checks, counting calls.
    #[derive(Default)]
    struct FakeGatewayClient {
        stored: Mutex<Option<ApplicationGateway>>,
        gets: AtomicUsize,
        applies: AtomicUsize,
        fail_get: Option<GatewayError>,
    }

    impl FakeGatewayClient {
        fn with_gateway(gateway: ApplicationGateway) -> Self {
            Self {
                stored: Mutex::new(Some(gateway)),
                ..Default::default()
            }
        }

        fn stored(&self) -> ApplicationGateway {
            self.stored.lock().unwrap().clone().expect("gateway stored")
        }

        /// Simulate a concurrent writer bumping the etag.
        fn bump_etag(&self) {
            if let Some(gw) = self.stored.lock().unwrap().as_mut() {
                gw.etag = Some("W/\"concurrent\"".to_string());
            }
        }
    }

    #[async_trait]
    impl GatewayClient for FakeGatewayClient {
        async fn get(&self, group: &str, name: &str) -> Result<ApplicationGateway, GatewayError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.fail_get {
                return Err(err.clone());
            }
            self.stored
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| GatewayError::NotFound {
                    group: group.to_string(),
                    name: name.to_string(),
                })
        }

        async fn create_or_update(
            &self,
            group: &str,
            name: &str,
            gateway: &ApplicationGateway,
        ) -> Result<ApplicationGateway, GatewayError> {
            let mut stored = self.stored.lock().unwrap();
            let current_etag = stored.as_ref().and_then(|gw| gw.etag.clone());
            if current_etag != gateway.etag {
                return Err(GatewayError::Conflict {
                    group: group.to_string(),
                    name: name.to_string(),
                });
            }
            let count = self.applies.fetch_add(1, Ordering::SeqCst) + 1;
            let mut updated = gateway.clone();
            updated.etag = Some(format!("W/\"apply-{count}\""));
            *stored = Some(updated.clone());
            Ok(updated)
        }
    }

    fn target() -> GatewayTarget {
        GatewayTarget::new("rg", "agw")
    }

    fn reconciler(gateway: ApplicationGateway) -> GatewayReconciler<FakeGatewayClient> {
        GatewayReconciler::new(FakeGatewayClient::with_gateway(gateway))
    }

    fn addresses() -> Vec<BackendAddress> {
        vec![BackendAddress::ip("10.0.0.1"), BackendAddress::ip("10.0.0.2")]
    }

    #[tokio::test]
    async fn test_fetch_empty_name_is_absent_without_call() {
        let r = reconciler(sample_gateway());

        let fetched = r.fetch(&GatewayTarget::new("rg", "")).await.unwrap();

        assert!(fetched.is_none());
        assert_eq!(r.client().gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_absent() {
        let r = GatewayReconciler::new(FakeGatewayClient::default());
        assert!(r.fetch(&target()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_propagates_transport_error() {
        let r = GatewayReconciler::new(FakeGatewayClient {
            fail_get: Some(GatewayError::Transport {
                group: "rg".to_string(),
                name: "agw".to_string(),
                reason: "connection reset".to_string(),
            }),
            ..Default::default()
        });

        let err = r.fetch(&target()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_sync_backend_pool_skips_without_gateway_name() {
        let r = reconciler(sample_gateway());

        let outcome = r
            .sync_backend_pool(&GatewayTarget::new("rg", ""), "lb1", addresses(), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Skipped);
        assert_eq!(r.client().gets.load(Ordering::SeqCst), 0);
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_backend_pool_missing_gateway_is_configuration_absent() {
        let r = GatewayReconciler::new(FakeGatewayClient::default());

        let err = r
            .sync_backend_pool(&target(), "lb1", addresses(), None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::ConfigurationAbsent {
                group: "rg".to_string(),
                name: "agw".to_string(),
            }
        );
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_backend_pool_adds_pool_and_only_missing_rules() {
        let mut gw = sample_gateway();
        rules::add_rule(&mut gw, "lb1", "existing", "old.example.com").unwrap();
        let r = reconciler(gw);

        let intents = vec![
            RoutingIntent::new("existing", "new.example.com"),
            RoutingIntent::new("fresh", "fresh.example.com"),
        ];
        let outcome = r
            .sync_backend_pool(&target(), "lb1", addresses(), Some(&intents))
            .await
            .unwrap();

        assert!(outcome.is_applied());
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 1);

        let stored = r.client().stored();
        assert_eq!(pool_names(&stored), vec!["manual", "lb1-backendpool"]);
        assert_eq!(
            stored
                .backend_pool("lb1-backendpool")
                .unwrap()
                .properties
                .backend_addresses,
            addresses()
        );
        assert_eq!(
            listener_names(&stored),
            vec!["manual-listener", "existing-cps-listener", "fresh-cps-listener"]
        );
        assert_eq!(
            stored
                .http_listener("existing-cps-listener")
                .unwrap()
                .properties
                .host_name
                .as_deref(),
            Some("old.example.com")
        );
    }

    #[tokio::test]
    async fn test_sync_backend_pool_rule_failure_applies_nothing() {
        let mut gw = sample_gateway();
        gw.properties.frontend_ports.clear();
        let r = reconciler(gw);

        let err = r
            .sync_backend_pool(
                &target(),
                "lb1",
                addresses(),
                Some(&[RoutingIntent::new("a", "a.example.com")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::NoHttpFrontendPort { .. }));
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_backend_pool_removes_pool_and_published_rules() {
        let mut gw = sample_gateway();
        pool::add_or_replace_pool(&mut gw, "lb1", addresses());
        rules::add_rule(&mut gw, "lb1", "a", "a.example.com").unwrap();
        rules::add_rule(&mut gw, "lb1", "b", "b.example.com").unwrap();
        let r = reconciler(gw);

        let outcome = r
            .delete_backend_pool(&target(), "lb1", Some("{'a': 'Success', 'b': 'Pending'}"))
            .await
            .unwrap();

        assert!(outcome.is_applied());
        let stored = r.client().stored();
        assert_eq!(pool_names(&stored), vec!["manual"]);
        assert_eq!(listener_names(&stored), vec!["manual-listener", "b-cps-listener"]);
        assert_eq!(rule_names(&stored), vec!["manual-rule", "b-cps-rule"]);
    }

    #[tokio::test]
    async fn test_delete_backend_pool_malformed_status_never_fetches() {
        let r = reconciler(sample_gateway());

        let err = r
            .delete_backend_pool(&target(), "lb1", Some("{not json"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::MalformedStatusRecord { .. }));
        assert_eq!(r.client().gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_backend_pool_skips_without_gateway_name() {
        let r = reconciler(sample_gateway());

        let outcome = r
            .delete_backend_pool(&GatewayTarget::new("rg", ""), "lb1", None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Skipped);
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_pool_members_replaces_addresses() {
        let mut gw = sample_gateway();
        pool::add_or_replace_pool(&mut gw, "lb1", vec![BackendAddress::ip("10.9.9.9")]);
        let r = reconciler(gw);

        let outcome = r
            .refresh_pool_members(&target(), "lb1", addresses())
            .await
            .unwrap();

        assert!(outcome.is_applied());
        assert_eq!(
            r.client()
                .stored()
                .backend_pool("lb1-backendpool")
                .unwrap()
                .properties
                .backend_addresses,
            addresses()
        );
    }

    #[tokio::test]
    async fn test_refresh_pool_members_without_pool_applies_nothing() {
        let r = reconciler(sample_gateway());

        let outcome = r
            .refresh_pool_members(&target(), "lb1", addresses())
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::PoolMissing);
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_pool_members_requires_gateway() {
        let r = reconciler(sample_gateway());

        let err = r
            .refresh_pool_members(&GatewayTarget::new("rg", ""), "lb1", addresses())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::ConfigurationAbsent { .. }));
    }

    #[tokio::test]
    async fn test_publish_then_withdraw_rule() {
        let mut gw = sample_gateway();
        pool::add_or_replace_pool(&mut gw, "lb1", addresses());
        let r = reconciler(gw);
        let before = r.client().stored();

        r.publish_rule(&target(), "lb1", &RoutingIntent::new("r1", "example.com"))
            .await
            .unwrap();
        assert!(r.client().stored().routing_rule("r1-cps-rule").is_some());

        r.withdraw_rule(&target(), "r1").await.unwrap();

        let after = r.client().stored();
        assert_eq!(after.properties, before.properties);
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_rule_without_pool_applies_nothing() {
        let r = reconciler(sample_gateway());

        let outcome = r
            .publish_rule(&target(), "lb1", &RoutingIntent::new("r1", "example.com"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::PoolMissing);
        assert_eq!(r.client().applies.load(Ordering::SeqCst), 0);
        assert!(r.client().stored().routing_rule("r1-cps-rule").is_none());
    }

    #[tokio::test]
    async fn test_withdraw_rule_requires_gateway() {
        let r = GatewayReconciler::new(FakeGatewayClient::default());

        let err = r.withdraw_rule(&target(), "r1").await.unwrap_err();

        assert!(matches!(err, GatewayError::ConfigurationAbsent { .. }));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_conflict() {
        struct RacingClient(FakeGatewayClient);

        #[async_trait]
        impl GatewayClient for RacingClient {
            async fn get(
                &self,
                group: &str,
                name: &str,
            ) -> Result<ApplicationGateway, GatewayError> {
                let gw = self.0.get(group, name).await;
                self.0.bump_etag();
                gw
            }

            async fn create_or_update(
                &self,
                group: &str,
                name: &str,
                gateway: &ApplicationGateway,
            ) -> Result<ApplicationGateway, GatewayError> {
                self.0.create_or_update(group, name, gateway).await
            }
        }

        let mut gw = sample_gateway();
        pool::add_or_replace_pool(&mut gw, "lb1", addresses());
        let r = GatewayReconciler::new(RacingClient(FakeGatewayClient::with_gateway(gw)));

        let err = r
            .publish_rule(&target(), "lb1", &RoutingIntent::new("r1", "example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Conflict { .. }));
        assert!(r.client().0.stored().routing_rule("r1-cps-rule").is_none());
    }
}
