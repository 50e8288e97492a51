use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ScopeName;

/// Immutable record of one disclosure attempt, hit or miss.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub user_id: Option<Uuid>,
    pub nik: String,
    pub scopes_used: Vec<ScopeName>,
    pub request_payload: serde_json::Value,
    pub response_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        partner_id: Uuid,
        nik: String,
        scopes_used: Vec<ScopeName>,
        request_payload: serde_json::Value,
        response_payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            partner_id,
            user_id: None,
            nik,
            scopes_used,
            request_payload,
            response_payload,
            created_at,
        }
    }
}
