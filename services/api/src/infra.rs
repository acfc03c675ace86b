use metrics_exporter_prometheus::PrometheusHandle;
use nagrik_neeti::config::BackendConfig;
use nagrik_neeti::entities::{AccessResult, Role};
use nagrik_neeti::storage::InMemoryObjectStore;
use nagrik_neeti::store::{InMemoryDocumentStore, TimeoutStore};
use nagrik_neeti::Portal;
use serde_json::{json, Map, Value};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type Backend = TimeoutStore<InMemoryDocumentStore>;
pub(crate) type AppPortal = Portal<Backend, InMemoryObjectStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Document and object stores for the configured backend project, with every document
/// call bounded by the configured timeout.
pub(crate) fn build_portal(config: &BackendConfig) -> (Arc<Backend>, Arc<AppPortal>) {
    let store = Arc::new(TimeoutStore::new(
        InMemoryDocumentStore::new(),
        config.timeout(),
    ));
    let objects = Arc::new(InMemoryObjectStore::new(config.storage_bucket.clone()));
    info!(
        project_id = %config.project_id,
        bucket = %config.storage_bucket,
        timeout_ms = config.timeout_ms,
        "backend stores ready"
    );
    (Arc::clone(&store), Arc::new(Portal::new(store, objects)))
}

/// Make sure `uid` has a profile with the admin role.
pub(crate) async fn ensure_admin(portal: &AppPortal, uid: &str) -> AccessResult<()> {
    let role = json!({ "role": Role::Admin.as_str() });
    let role: Map<String, Value> = role.as_object().cloned().unwrap_or_default();

    if portal.users.get_by_id(uid).await?.is_some() {
        portal.users.update(uid, &role).await?;
    } else {
        portal.users.create(uid, &role).await?;
    }
    info!(uid, "administrator registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn backend_config() -> BackendConfig {
        BackendConfig {
            project_id: "nagrik-neeti-test".to_string(),
            api_key: None,
            storage_bucket: "nagrik-neeti-test.appspot.com".to_string(),
            timeout_ms: 250,
        }
    }

    #[tokio::test]
    async fn portal_store_is_bounded_by_configured_timeout() {
        let (store, _portal) = build_portal(&backend_config());
        assert_eq!(store.limit(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn ensure_admin_promotes_existing_profiles() {
        let (_store, portal) = build_portal(&backend_config());
        let profile = json!({ "name": "Meera" });
        portal
            .users
            .create("uid-1", profile.as_object().expect("object literal"))
            .await
            .expect("registered");

        ensure_admin(&portal, "uid-1").await.expect("promoted");
        let admin = portal.users.require_admin("uid-1").await.expect("admin");
        assert_eq!(admin.name.as_deref(), Some("Meera"));

        ensure_admin(&portal, "uid-2").await.expect("created");
        assert!(portal.users.require_admin("uid-2").await.is_ok());
    }
}
