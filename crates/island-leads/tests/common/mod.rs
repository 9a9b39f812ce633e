#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use island_leads::edge::{edge_router, EdgeExportService};
use island_leads::leads::{
    lead_router, EmailGateway, Lead, LeadService, LeadStore, NotificationFanout, NotifyError,
    SheetGateway, StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Lead>>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<(String, Lead)> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .iter()
            .map(|(key, lead)| (key.clone(), lead.clone()))
            .collect()
    }

    pub fn seed(&self, key: &str, lead: Lead) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), lead);
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn set(&self, key: &str, lead: &Lead) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.seed(key, lead.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Lead>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Lead)>, StoreError> {
        Ok(self
            .records()
            .into_iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryEmail {
    pub sent: Mutex<Vec<String>>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl EmailGateway for MemoryEmail {
    async fn send(&self, lead: &Lead) -> Result<(), NotifyError> {
        if let Some(body) = &self.fail_with {
            return Err(NotifyError::Upstream(body.clone()));
        }
        self.sent
            .lock()
            .expect("email mutex poisoned")
            .push(lead.email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySheet {
    pub rows: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl SheetGateway for MemorySheet {
    async fn append(&self, lead: &Lead) -> Result<(), NotifyError> {
        self.rows.lock().expect("sheet mutex poisoned").push(vec![
            lead.timestamp.clone(),
            lead.name.clone(),
            lead.email.clone(),
            lead.whatsapp.clone(),
            lead.source.clone(),
        ]);
        Ok(())
    }

    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, NotifyError> {
        Ok(self.rows.lock().expect("sheet mutex poisoned").clone())
    }
}

pub fn lead(timestamp: &str, name: &str) -> Lead {
    Lead {
        name: name.to_string(),
        whatsapp: "+971500000000".to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase().replace(' ', ".")),
        timestamp: timestamp.to_string(),
        source: "dubaiislandhouse.com".to_string(),
    }
}

pub fn intake_router(store: Arc<MemoryStore>, admin_token: Option<&str>) -> axum::Router {
    let service = Arc::new(LeadService::new(
        store,
        NotificationFanout::default(),
        admin_token.map(str::to_string),
    ));
    lead_router(service)
}

pub fn edge_test_router(
    download_token: Option<&str>,
    store: Option<Arc<MemoryStore>>,
    sheet: Option<Arc<MemorySheet>>,
) -> axum::Router {
    let service = Arc::new(EdgeExportService::new(
        download_token.map(str::to_string),
        store.map(|s| s as Arc<dyn LeadStore>),
        sheet.map(|s| s as Arc<dyn SheetGateway>),
    ));
    edge_router(service)
}
