use chrono::NaiveDate;
use std::sync::Arc;

use crate::dtos::checking::{CheckOutcome, CheckRequest};
use crate::models::AuditEntry;
use crate::services::audit::AuditRecorder;
use crate::services::clock::Clock;
use crate::services::gate::AuthorizationContext;
use crate::services::metrics::record_check;
use crate::services::policy::project;
use crate::services::store::WorkerDirectory;
use crate::services::ServiceError;

/// Verify-and-disclose lookup for an already authorized partner.
#[derive(Clone)]
pub struct DisclosureService {
    workers: Arc<dyn WorkerDirectory>,
    audit: AuditRecorder,
    clock: Arc<dyn Clock>,
}

impl DisclosureService {
    pub fn new(
        workers: Arc<dyn WorkerDirectory>,
        audit: AuditRecorder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            workers,
            audit,
            clock,
        }
    }

    /// A record is disclosed only when both the identifier and the birth date
    /// match. Hits and misses are audited alike; the audit write happens off
    /// the request path.
    pub async fn check(
        &self,
        context: &AuthorizationContext,
        request: &CheckRequest,
    ) -> Result<CheckOutcome, ServiceError> {
        let nik = request.nik.trim();
        let tanggal_lahir = parse_birth_date(&request.tanggal_lahir)?;

        let outcome = match self.workers.find_worker(nik, tanggal_lahir).await? {
            Some(worker) => CheckOutcome::found(project(&worker, &context.allowed_scopes)),
            None => CheckOutcome::not_found(),
        };

        record_check(outcome.found);
        tracing::info!(
            partner_id = %context.partner_id,
            company_id = %context.company_id,
            found = outcome.found,
            "Worker check completed"
        );

        self.audit.dispatch(AuditEntry::new(
            context.partner_id,
            nik.to_string(),
            context.allowed_scopes.iter().copied().collect(),
            serde_json::to_value(request).unwrap_or_default(),
            serde_json::to_value(&outcome).unwrap_or_default(),
            self.clock.now(),
        ));

        Ok(outcome)
    }
}

fn parse_birth_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::Validation("tanggal_lahir must be a date in YYYY-MM-DD format".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MembershipStatus, ScopeName, WorkerRecord};
    use crate::services::{FixedClock, MemoryStore};
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn worker() -> WorkerRecord {
        WorkerRecord {
            nik: "3174091201900001".to_string(),
            nama: "Ana".to_string(),
            tanggal_lahir: date(1990, 1, 12),
            alamat: Some("Jl. Melati 5".to_string()),
            status_kepesertaan: MembershipStatus::Aktif,
            updated_at: Utc::now(),
        }
    }

    fn context(scopes: &[ScopeName]) -> AuthorizationContext {
        AuthorizationContext {
            partner_id: Uuid::new_v4(),
            company_id: "PT-ANA-001".to_string(),
            allowed_scopes: scopes.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn service(store: &MemoryStore) -> (DisclosureService, CancellationToken) {
        let shutdown = CancellationToken::new();
        let (recorder, _handle) =
            AuditRecorder::spawn(Arc::new(store.clone()), 16, shutdown.clone());
        let clock = FixedClock::on(date(2024, 6, 1));
        (
            DisclosureService::new(Arc::new(store.clone()), recorder, Arc::new(clock)),
            shutdown,
        )
    }

    async fn wait_for_audit(store: &MemoryStore, count: usize) {
        for _ in 0..100 {
            if store.audit_entries().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("audit entries never reached {}", count);
    }

    fn request(nik: &str, tanggal_lahir: &str) -> CheckRequest {
        CheckRequest {
            nik: nik.to_string(),
            tanggal_lahir: tanggal_lahir.to_string(),
        }
    }

    #[tokio::test]
    async fn test_match_discloses_only_granted_fields() {
        let store = MemoryStore::new();
        store.insert_worker(worker());
        let (service, _shutdown) = service(&store);
        let ctx = context(&[ScopeName::Name]);

        let outcome = service
            .check(&ctx, &request("3174091201900001", "1990-01-12"))
            .await
            .unwrap();

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["found"], true);
        assert_eq!(value["nama"], "Ana");
        assert!(value.get("alamat").is_none());
        assert!(value.get("tanggal_lahir").is_none());
        assert!(value.get("status_kepesertaan").is_none());
    }

    #[tokio::test]
    async fn test_birth_date_mismatch_is_not_found_and_audited() {
        let store = MemoryStore::new();
        store.insert_worker(worker());
        let (service, _shutdown) = service(&store);
        let ctx = context(&[ScopeName::Name, ScopeName::Alamat]);

        let outcome = service
            .check(&ctx, &request("3174091201900001", "1990-01-13"))
            .await
            .unwrap();
        assert_eq!(outcome, CheckOutcome::not_found());

        wait_for_audit(&store, 1).await;
        let entries = store.audit_entries();
        assert_eq!(entries[0].partner_id, ctx.partner_id);
        assert_eq!(entries[0].nik, "3174091201900001");
        assert_eq!(entries[0].response_payload, serde_json::json!({ "found": false }));
        assert_eq!(entries[0].scopes_used, vec![ScopeName::Name, ScopeName::Alamat]);
    }

    #[tokio::test]
    async fn test_audit_keeps_only_disclosed_payload() {
        let store = MemoryStore::new();
        store.insert_worker(worker());
        let (service, _shutdown) = service(&store);

        service
            .check(&context(&[ScopeName::Name]), &request("3174091201900001", "1990-01-12"))
            .await
            .unwrap();

        wait_for_audit(&store, 1).await;
        let payload = &store.audit_entries()[0].response_payload;
        assert_eq!(payload["nama"], "Ana");
        assert!(payload.get("alamat").is_none());
    }

    #[tokio::test]
    async fn test_malformed_date_is_rejected_without_audit() {
        let store = MemoryStore::new();
        let (service, _shutdown) = service(&store);

        let result = service
            .check(&context(&[ScopeName::Name]), &request("3174091201900001", "12-01-1990"))
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.audit_entries().is_empty());
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_change_the_response() {
        let store = MemoryStore::new();
        store.insert_worker(worker());
        store.fail_audit_writes(true);
        let (service, _shutdown) = service(&store);

        let outcome = service
            .check(&context(&[ScopeName::Name]), &request("3174091201900001", "1990-01-12"))
            .await
            .unwrap();
        assert!(outcome.found);
    }
}
