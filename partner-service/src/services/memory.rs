//! In-process store used by tests and local runs.
//!
//! Every operation takes the lock once and never awaits while holding it, so
//! each call is atomic with respect to the others.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{
    ActivationChange, AdminPrincipal, AuditEntry, Partner, ScopeGrant, ScopeName, WorkerRecord,
};
use crate::services::store::{AdminStore, AuditSink, PartnerStore, WorkerDirectory};
use crate::services::ServiceError;

#[derive(Default)]
struct MemoryState {
    partners: HashMap<Uuid, Partner>,
    grants: HashMap<(Uuid, ScopeName), ScopeGrant>,
    workers: HashMap<String, WorkerRecord>,
    admins: HashMap<String, AdminPrincipal>,
    audit_log: Vec<AuditEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_audit_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ServiceError> {
        self.state
            .lock()
            .map_err(|_| ServiceError::Internal(anyhow::anyhow!("Memory store lock poisoned")))
    }

    pub fn insert_worker(&self, worker: WorkerRecord) {
        if let Ok(mut state) = self.lock() {
            state.workers.insert(worker.nik.clone(), worker);
        }
    }

    /// Snapshot of everything the audit sink has accepted so far.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.lock()
            .map(|state| state.audit_log.clone())
            .unwrap_or_default()
    }

    /// Make subsequent audit writes fail, to exercise the best-effort path.
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PartnerStore for MemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.lock().map(|_| ())
    }

    async fn find_partner_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Partner>, ServiceError> {
        let state = self.lock()?;
        Ok(state
            .partners
            .values()
            .find(|p| p.api_key == api_key)
            .cloned())
    }

    async fn find_partner_by_id(&self, id: Uuid) -> Result<Option<Partner>, ServiceError> {
        Ok(self.lock()?.partners.get(&id).cloned())
    }

    async fn list_partners(&self) -> Result<Vec<Partner>, ServiceError> {
        let mut partners: Vec<Partner> = self.lock()?.partners.values().cloned().collect();
        partners.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(partners)
    }

    async fn company_id_taken(
        &self,
        company_id: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, ServiceError> {
        let state = self.lock()?;
        Ok(state
            .partners
            .values()
            .any(|p| p.company_id == company_id && Some(p.id) != excluding))
    }

    async fn insert_partner(
        &self,
        partner: &Partner,
        grants: &[ScopeGrant],
    ) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        let duplicate = state.partners.values().any(|p| {
            p.id == partner.id || p.company_id == partner.company_id || p.api_key == partner.api_key
        });
        if duplicate {
            return Err(ServiceError::Conflict(
                "Company ID or API key already exists".to_string(),
            ));
        }

        state.partners.insert(partner.id, partner.clone());
        for grant in grants {
            state
                .grants
                .insert((grant.partner_id, grant.scope_name), grant.clone());
        }
        Ok(())
    }

    async fn update_partner(
        &self,
        partner: &Partner,
        activation: Option<ActivationChange>,
    ) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        if state
            .partners
            .values()
            .any(|p| p.id != partner.id && p.company_id == partner.company_id)
        {
            return Err(ServiceError::Conflict(
                "Company ID already exists".to_string(),
            ));
        }

        let stored = state
            .partners
            .get_mut(&partner.id)
            .ok_or(ServiceError::PartnerNotFound)?;
        // Credential changes only go through rotation.
        let api_key = std::mem::take(&mut stored.api_key);
        let (is_active, disabled_by_admin) = match activation {
            Some(change) => (change.is_active(), change.disabled_by_admin()),
            None => (stored.is_active, stored.disabled_by_admin),
        };
        *stored = Partner {
            api_key,
            is_active,
            disabled_by_admin,
            ..partner.clone()
        };
        Ok(())
    }

    async fn expire_partner(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Partner>, ServiceError> {
        let mut state = self.lock()?;
        match state.partners.get_mut(&id) {
            Some(partner) if partner.is_active && partner.contract_elapsed(today) => {
                partner.is_active = false;
                partner.updated_at = Utc::now();
                Ok(Some(partner.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn deactivate_partner(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut state = self.lock()?;
        match state.partners.get_mut(&id) {
            Some(partner) => {
                partner.is_active = false;
                partner.disabled_by_admin = true;
                partner.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate_api_key(
        &self,
        id: Uuid,
        new_api_key: &str,
    ) -> Result<Option<Partner>, ServiceError> {
        let mut state = self.lock()?;
        if state
            .partners
            .values()
            .any(|p| p.id != id && p.api_key == new_api_key)
        {
            return Err(ServiceError::Conflict("API key already exists".to_string()));
        }
        Ok(state.partners.get_mut(&id).map(|partner| {
            partner.api_key = new_api_key.to_string();
            partner.updated_at = Utc::now();
            partner.clone()
        }))
    }

    async fn scopes_for_partner(&self, partner_id: Uuid) -> Result<Vec<ScopeGrant>, ServiceError> {
        let state = self.lock()?;
        let mut grants: Vec<ScopeGrant> = state
            .grants
            .values()
            .filter(|g| g.partner_id == partner_id)
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.scope_name.as_str());
        Ok(grants)
    }

    async fn upsert_scopes(
        &self,
        partner_id: Uuid,
        grants: &[(ScopeName, bool)],
    ) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        if !state.partners.contains_key(&partner_id) {
            return Err(ServiceError::PartnerNotFound);
        }
        for (scope, enabled) in grants {
            state
                .grants
                .entry((partner_id, *scope))
                .and_modify(|g| g.enabled = *enabled)
                .or_insert_with(|| ScopeGrant::new(partner_id, *scope, *enabled));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerDirectory for MemoryStore {
    async fn find_worker(
        &self,
        nik: &str,
        tanggal_lahir: NaiveDate,
    ) -> Result<Option<WorkerRecord>, ServiceError> {
        let state = self.lock()?;
        Ok(state
            .workers
            .get(nik)
            .filter(|w| w.tanggal_lahir == tanggal_lahir)
            .cloned())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record(&self, entry: &AuditEntry) -> Result<(), ServiceError> {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Audit store unavailable"
            )));
        }
        self.lock()?.audit_log.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminPrincipal>, ServiceError> {
        Ok(self.lock()?.admins.get(username).cloned())
    }

    async fn insert_admin(&self, admin: &AdminPrincipal) -> Result<(), ServiceError> {
        let mut state = self.lock()?;
        if state.admins.contains_key(&admin.username) {
            return Err(ServiceError::Conflict(
                "Admin username already exists".to_string(),
            ));
        }
        state.admins.insert(admin.username.clone(), admin.clone());
        Ok(())
    }
}
