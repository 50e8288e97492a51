//! PostgreSQL implementation of the store traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::models::{
    ActivationChange, AdminPrincipal, AdminRow, AuditEntry, Partner, ScopeGrant, ScopeGrantRow,
    ScopeName, WorkerRecord, WorkerRow,
};
use crate::services::store::{AdminStore, AuditSink, PartnerStore, WorkerDirectory};
use crate::services::ServiceError;

const PARTNER_COLUMNS: &str = "id, company_name, company_id, api_key, nomor_pks, pic_name, \
     pic_email, pic_phone, is_active, disabled_by_admin, contract_start, contract_end, notes, \
     created_at, updated_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Unique-constraint violations become conflicts; anything else is a store fault.
fn map_write_error(err: sqlx::Error, what: &str) -> ServiceError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ServiceError::Conflict(format!("{} already exists", what))
        }
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
            ServiceError::Validation(format!("{} violates a constraint", what))
        }
        _ => ServiceError::Database(err),
    }
}

fn corrupt_row(detail: String) -> ServiceError {
    ServiceError::Internal(anyhow::anyhow!("Corrupt row: {}", detail))
}

#[async_trait]
impl PartnerStore for Database {
    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                ServiceError::Database(e)
            })?;
        Ok(())
    }

    async fn find_partner_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Partner>, ServiceError> {
        let partner = sqlx::query_as::<_, Partner>(&format!(
            "SELECT {} FROM partners WHERE api_key = $1",
            PARTNER_COLUMNS
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(partner)
    }

    async fn find_partner_by_id(&self, id: Uuid) -> Result<Option<Partner>, ServiceError> {
        let partner = sqlx::query_as::<_, Partner>(&format!(
            "SELECT {} FROM partners WHERE id = $1",
            PARTNER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(partner)
    }

    async fn list_partners(&self) -> Result<Vec<Partner>, ServiceError> {
        let partners = sqlx::query_as::<_, Partner>(&format!(
            "SELECT {} FROM partners ORDER BY created_at DESC",
            PARTNER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(partners)
    }

    async fn company_id_taken(
        &self,
        company_id: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, ServiceError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM partners WHERE company_id = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(company_id)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_partner(
        &self,
        partner: &Partner,
        grants: &[ScopeGrant],
    ) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO partners (id, company_name, company_id, api_key, nomor_pks, pic_name,
                pic_email, pic_phone, is_active, disabled_by_admin, contract_start, contract_end,
                notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(partner.id)
        .bind(&partner.company_name)
        .bind(&partner.company_id)
        .bind(&partner.api_key)
        .bind(&partner.nomor_pks)
        .bind(&partner.pic_name)
        .bind(&partner.pic_email)
        .bind(&partner.pic_phone)
        .bind(partner.is_active)
        .bind(partner.disabled_by_admin)
        .bind(partner.contract_start)
        .bind(partner.contract_end)
        .bind(&partner.notes)
        .bind(partner.created_at)
        .bind(partner.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Company ID or API key"))?;

        for grant in grants {
            sqlx::query(
                r#"
                INSERT INTO partner_access_scopes (id, partner_id, scope_name, enabled)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(grant.id)
            .bind(grant.partner_id)
            .bind(grant.scope_name.as_str())
            .bind(grant.enabled)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "Scope grant"))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_partner(
        &self,
        partner: &Partner,
        activation: Option<ActivationChange>,
    ) -> Result<(), ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE partners
            SET company_name = $2, company_id = $3, pic_name = $4, pic_email = $5,
                pic_phone = $6, is_active = COALESCE($7, is_active),
                disabled_by_admin = COALESCE($8, disabled_by_admin),
                contract_start = $9, contract_end = $10, notes = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(partner.id)
        .bind(&partner.company_name)
        .bind(&partner.company_id)
        .bind(&partner.pic_name)
        .bind(&partner.pic_email)
        .bind(&partner.pic_phone)
        .bind(activation.map(ActivationChange::is_active))
        .bind(activation.map(ActivationChange::disabled_by_admin))
        .bind(partner.contract_start)
        .bind(partner.contract_end)
        .bind(&partner.notes)
        .bind(partner.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Company ID"))?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::PartnerNotFound);
        }
        Ok(())
    }

    async fn expire_partner(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Partner>, ServiceError> {
        let partner = sqlx::query_as::<_, Partner>(&format!(
            r#"
            UPDATE partners
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active AND contract_end IS NOT NULL AND contract_end < $2
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        ))
        .bind(id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;
        Ok(partner)
    }

    async fn deactivate_partner(&self, id: Uuid) -> Result<bool, ServiceError> {
        let result =
            sqlx::query(
                "UPDATE partners SET is_active = FALSE, disabled_by_admin = TRUE, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rotate_api_key(
        &self,
        id: Uuid,
        new_api_key: &str,
    ) -> Result<Option<Partner>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM partners WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let partner = sqlx::query_as::<_, Partner>(&format!(
            "UPDATE partners SET api_key = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PARTNER_COLUMNS
        ))
        .bind(id)
        .bind(new_api_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "API key"))?;

        tx.commit().await?;
        Ok(Some(partner))
    }

    async fn scopes_for_partner(&self, partner_id: Uuid) -> Result<Vec<ScopeGrant>, ServiceError> {
        let rows = sqlx::query_as::<_, ScopeGrantRow>(
            "SELECT id, partner_id, scope_name, enabled FROM partner_access_scopes WHERE partner_id = $1 ORDER BY scope_name",
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| ScopeGrant::try_from(row).map_err(corrupt_row))
            .collect()
    }

    async fn upsert_scopes(
        &self,
        partner_id: Uuid,
        grants: &[(ScopeName, bool)],
    ) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        for (scope, enabled) in grants {
            sqlx::query(
                r#"
                INSERT INTO partner_access_scopes (id, partner_id, scope_name, enabled)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (partner_id, scope_name) DO UPDATE SET enabled = EXCLUDED.enabled
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(partner_id)
            .bind(scope.as_str())
            .bind(*enabled)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "Scope grant"))?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl WorkerDirectory for Database {
    async fn find_worker(
        &self,
        nik: &str,
        tanggal_lahir: NaiveDate,
    ) -> Result<Option<WorkerRecord>, ServiceError> {
        let row = sqlx::query_as::<_, WorkerRow>(
            r#"
            SELECT nik, nama, tanggal_lahir, alamat, status_kepesertaan, updated_at
            FROM tk_data
            WHERE nik = $1 AND tanggal_lahir = $2
            "#,
        )
        .bind(nik)
        .bind(tanggal_lahir)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| WorkerRecord::try_from(r).map_err(corrupt_row))
            .transpose()
    }
}

#[async_trait]
impl AuditSink for Database {
    async fn record(&self, entry: &AuditEntry) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, partner_id, user_id, nik, scopes_used,
                request_payload, response_payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.partner_id)
        .bind(entry.user_id)
        .bind(&entry.nik)
        .bind(sqlx::types::Json(&entry.scopes_used))
        .bind(sqlx::types::Json(&entry.request_payload))
        .bind(sqlx::types::Json(&entry.response_payload))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for Database {
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminPrincipal>, ServiceError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, username, password_hash, role, is_active, created_at FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| AdminPrincipal::try_from(r).map_err(corrupt_row))
            .transpose()
    }

    async fn insert_admin(&self, admin: &AdminPrincipal) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, username, password_hash, role, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(admin.id)
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(admin.role.to_string())
        .bind(admin.is_active)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Admin username"))?;
        Ok(())
    }
}
