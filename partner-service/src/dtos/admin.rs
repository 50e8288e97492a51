use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{AdminRole, EffectiveStatus, Partner, ScopeGrant, ScopeName};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreatePartnerRequest {
    #[validate(length(max = 255))]
    #[schema(example = "PT Maju Jaya")]
    pub company_name: String,
    /// Generated as `PT-XXX-ABC` when omitted.
    #[serde(default)]
    pub company_id: Option<String>,
    #[validate(length(max = 255))]
    pub pic_name: String,
    #[validate(length(max = 255))]
    pub pic_email: String,
    #[serde(default)]
    pub pic_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to `name`, `tanggal_lahir`, `status_bpjs`.
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    /// `YYYY-MM-DD`; defaults to today.
    #[serde(default)]
    pub contract_start: Option<String>,
    /// `YYYY-MM-DD`; defaults to start plus one year.
    #[serde(default)]
    pub contract_end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePartnerRequest {
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    #[validate(length(max = 255))]
    pub pic_name: Option<String>,
    pub pic_email: Option<String>,
    pub pic_phone: Option<String>,
    /// `active`/`inactive` or `Y`/`N`. Ignored when `contract_end` is also given.
    pub status: Option<String>,
    pub contract_start: Option<String>,
    pub contract_end: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ScopeItem {
    pub scope_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateScopesRequest {
    #[validate(length(min = 1, message = "at least one scope is required"))]
    pub scopes: Vec<ScopeItem>,
}

/// Partner as shown to admins, with its derived status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartnerView {
    #[serde(flatten)]
    pub partner: Partner,
    pub status_display: String,
    pub effective_status: EffectiveStatus,
}

impl PartnerView {
    pub fn new(partner: Partner, today: NaiveDate) -> Self {
        Self {
            status_display: partner.status_display().to_string(),
            effective_status: partner.effective_status(today),
            partner,
        }
    }
}

/// Response that carries a plaintext credential: creation, reveal and rotation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartnerCredentialResponse {
    pub partner: PartnerView,
    pub company_id: String,
    pub api_key: String,
    pub contract_start: NaiveDate,
    pub contract_end: Option<NaiveDate>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScopeView {
    pub scope_name: ScopeName,
    pub enabled: bool,
}

impl From<ScopeGrant> for ScopeView {
    fn from(grant: ScopeGrant) -> Self {
        Self {
            scope_name: grant.scope_name,
            enabled: grant.enabled,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub admin: AdminSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminSummary {
    pub id: uuid::Uuid,
    pub username: String,
    pub role: AdminRole,
}
