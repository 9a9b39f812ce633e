use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use island_leads::leads::{Lead, LeadStore, StoreError};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fallback store for local runs without Supabase credentials. A BTreeMap
/// keeps prefix scans ordered, like the backing table's key index.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLeadStore {
    records: Arc<Mutex<BTreeMap<String, Lead>>>,
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn set(&self, key: &str, lead: &Lead) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(key.to_string(), lead.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Lead>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Lead)>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, lead)| (key.clone(), lead.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use island_leads::config::SITE_SOURCE;

    fn lead(stamp: &str) -> Lead {
        Lead {
            name: "Jane Doe".to_string(),
            whatsapp: "+971500000000".to_string(),
            email: "jane@example.com".to_string(),
            timestamp: stamp.to_string(),
            source: SITE_SOURCE.to_string(),
        }
    }

    #[tokio::test]
    async fn prefix_scan_only_returns_matching_keys() {
        let store = InMemoryLeadStore::default();
        store
            .set("lead_1_aaa", &lead("2025-01-01T00:00:00Z"))
            .await
            .expect("write");
        store
            .set("other_key", &lead("2025-01-02T00:00:00Z"))
            .await
            .expect("write");

        let rows = store.get_by_prefix("lead_").await.expect("scan");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "lead_1_aaa");

        let fetched = store.get("lead_1_aaa").await.expect("get");
        assert!(fetched.is_some());
    }
}
