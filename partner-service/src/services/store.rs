//! Persistence seams. `Database` backs them with Postgres, `MemoryStore`
//! keeps everything in process for tests and local runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    ActivationChange, AdminPrincipal, AuditEntry, Partner, ScopeGrant, ScopeName, WorkerRecord,
};
use crate::services::ServiceError;

#[async_trait]
pub trait PartnerStore: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;

    async fn find_partner_by_api_key(&self, api_key: &str)
        -> Result<Option<Partner>, ServiceError>;

    async fn find_partner_by_id(&self, id: Uuid) -> Result<Option<Partner>, ServiceError>;

    async fn list_partners(&self) -> Result<Vec<Partner>, ServiceError>;

    /// True when another partner already holds `company_id`.
    async fn company_id_taken(
        &self,
        company_id: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, ServiceError>;

    /// Insert a partner and its initial grants as one unit. A duplicate
    /// company id or credential is a `Conflict`.
    async fn insert_partner(
        &self,
        partner: &Partner,
        grants: &[ScopeGrant],
    ) -> Result<(), ServiceError>;

    /// Overwrite the editable profile and contract columns. The active flag
    /// and the admin-disable marker are written only when `activation` is
    /// given, so a concurrent delete or expiry is never undone.
    async fn update_partner(
        &self,
        partner: &Partner,
        activation: Option<ActivationChange>,
    ) -> Result<(), ServiceError>;

    /// Mark an active partner inactive when its contract ended before
    /// `today` and return the row as written. Only the call that flips the
    /// flag gets `Some`. The write and the read are one statement.
    async fn expire_partner(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Partner>, ServiceError>;

    /// Soft delete: inactive and marked as disabled by an admin. Returns
    /// false when no such partner exists.
    async fn deactivate_partner(&self, id: Uuid) -> Result<bool, ServiceError>;

    /// Replace the credential under a row lock; concurrent rotations serialize.
    async fn rotate_api_key(
        &self,
        id: Uuid,
        new_api_key: &str,
    ) -> Result<Option<Partner>, ServiceError>;

    async fn scopes_for_partner(&self, partner_id: Uuid) -> Result<Vec<ScopeGrant>, ServiceError>;

    /// Upsert every pair or none of them.
    async fn upsert_scopes(
        &self,
        partner_id: Uuid,
        grants: &[(ScopeName, bool)],
    ) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Lookup requiring both the identifier and the birth date to match.
    async fn find_worker(
        &self,
        nik: &str,
        tanggal_lahir: NaiveDate,
    ) -> Result<Option<WorkerRecord>, ServiceError>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminPrincipal>, ServiceError>;

    async fn insert_admin(&self, admin: &AdminPrincipal) -> Result<(), ServiceError>;
}
