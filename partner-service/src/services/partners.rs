use chrono::{DateTime, Datelike, Months, NaiveDate};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Environment;
use crate::dtos::admin::{
    CreatePartnerRequest, PartnerCredentialResponse, PartnerView, ScopeItem, UpdatePartnerRequest,
};
use crate::models::{ActivationChange, Partner, ScopeGrant, ScopeName};
use crate::services::clock::Clock;
use crate::services::store::PartnerStore;
use crate::services::ServiceError;
use crate::utils::generator::{generate_api_key, generate_company_id, generate_pks_number};
use crate::utils::validation::{required, validate_email, validate_phone};

const ISSUED_NOTE: &str = "Store this API key securely and share it only with the partner";
const REVEALED_NOTE: &str = "This is the partner's current API key";
const ROTATED_NOTE: &str = "The previous API key stopped working immediately";

/// Admin-side lifecycle of partners: onboarding, edits, scope grants and the
/// partner credential.
#[derive(Clone)]
pub struct PartnerAdminService {
    partners: Arc<dyn PartnerStore>,
    clock: Arc<dyn Clock>,
    environment: Environment,
}

impl PartnerAdminService {
    pub fn new(
        partners: Arc<dyn PartnerStore>,
        clock: Arc<dyn Clock>,
        environment: Environment,
    ) -> Self {
        Self {
            partners,
            clock,
            environment,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn create_partner(
        &self,
        req: CreatePartnerRequest,
    ) -> Result<PartnerCredentialResponse, ServiceError> {
        let company_name =
            required(&req.company_name, "company_name").map_err(ServiceError::Validation)?;
        let pic_name = required(&req.pic_name, "pic_name").map_err(ServiceError::Validation)?;
        let pic_email =
            required(&req.pic_email, "pic_email").map_err(ServiceError::Validation)?;
        validate_email(&pic_email).map_err(ServiceError::Validation)?;
        let pic_phone = validate_phone(req.pic_phone.as_deref().unwrap_or_default())
            .map_err(ServiceError::Validation)?;

        let company_id = match non_blank(req.company_id.as_deref()) {
            Some(id) => id.to_string(),
            None => generate_company_id(&company_name),
        };
        if self.partners.company_id_taken(&company_id, None).await? {
            return Err(ServiceError::Conflict(format!(
                "Company ID {} already exists",
                company_id
            )));
        }

        let today = self.clock.today();
        let contract_start = match non_blank(req.contract_start.as_deref()) {
            Some(raw) => parse_contract_date(raw, "contract_start")?,
            None => today,
        };
        let contract_end = match non_blank(req.contract_end.as_deref()) {
            Some(raw) => parse_contract_date(raw, "contract_end")?,
            None => one_year_after(contract_start)?,
        };
        check_window(contract_start, Some(contract_end))?;

        let granted = match req.scopes.as_deref() {
            None | Some([]) => ScopeName::defaults(),
            Some(names) => parse_scope_names(names)?,
        };

        let now = self.clock.now();
        let api_key = generate_api_key(&self.environment);
        let partner = Partner {
            id: Uuid::new_v4(),
            company_name,
            company_id,
            api_key: api_key.clone(),
            nomor_pks: generate_pks_number(today.year()),
            pic_name,
            pic_email,
            pic_phone,
            is_active: contract_end >= today,
            disabled_by_admin: false,
            contract_start,
            contract_end: Some(contract_end),
            notes: req.notes.and_then(|n| non_blank(Some(n.as_str())).map(str::to_string)),
            created_at: now,
            updated_at: now,
        };
        let grants: Vec<ScopeGrant> = ScopeName::ALL
            .iter()
            .map(|scope| ScopeGrant::new(partner.id, *scope, granted.contains(scope)))
            .collect();

        self.partners.insert_partner(&partner, &grants).await?;

        tracing::info!(
            partner_id = %partner.id,
            company_id = %partner.company_id,
            nomor_pks = %partner.nomor_pks,
            scopes = ?granted,
            "Partner onboarded"
        );

        Ok(self.credential_response(partner, api_key, ISSUED_NOTE))
    }

    pub async fn list_partners(&self) -> Result<Vec<PartnerView>, ServiceError> {
        let today = self.clock.today();
        Ok(self
            .partners
            .list_partners()
            .await?
            .into_iter()
            .map(|p| PartnerView::new(p, today))
            .collect())
    }

    pub async fn get_partner(&self, id: Uuid) -> Result<PartnerView, ServiceError> {
        let partner = self.find(id).await?;
        Ok(PartnerView::new(partner, self.clock.today()))
    }

    /// Partial update. An explicit `contract_end` decides the active flag;
    /// otherwise `status` does; otherwise the flag is left alone. The view
    /// returned is the stored row after the write.
    pub async fn update_partner(
        &self,
        id: Uuid,
        req: UpdatePartnerRequest,
    ) -> Result<PartnerView, ServiceError> {
        let mut partner = self.find(id).await?;
        let today = self.clock.today();

        if let Some(name) = req.company_name.as_deref() {
            partner.company_name =
                required(name, "company_name").map_err(ServiceError::Validation)?;
        }
        if let Some(company_id) = non_blank(req.company_id.as_deref()) {
            if company_id != partner.company_id {
                if self.partners.company_id_taken(company_id, Some(id)).await? {
                    return Err(ServiceError::Conflict(format!(
                        "Company ID {} already exists",
                        company_id
                    )));
                }
                partner.company_id = company_id.to_string();
            }
        }
        if let Some(name) = req.pic_name.as_deref() {
            partner.pic_name = required(name, "pic_name").map_err(ServiceError::Validation)?;
        }
        if let Some(email) = req.pic_email.as_deref() {
            let email = required(email, "pic_email").map_err(ServiceError::Validation)?;
            validate_email(&email).map_err(ServiceError::Validation)?;
            partner.pic_email = email;
        }
        if let Some(phone) = req.pic_phone.as_deref() {
            partner.pic_phone = validate_phone(phone).map_err(ServiceError::Validation)?;
        }

        let mut activation = None;
        if let Some(status) = non_blank(req.status.as_deref()) {
            activation = Some(ActivationChange::Manual(parse_status(status)?));
        }
        if let Some(raw) = non_blank(req.contract_start.as_deref()) {
            partner.contract_start = parse_contract_date(raw, "contract_start")?;
        }
        if let Some(raw) = non_blank(req.contract_end.as_deref()) {
            let end = parse_contract_date(raw, "contract_end")?;
            partner.contract_end = Some(end);
            activation = Some(ActivationChange::Contract(end >= today));
        }
        check_window(partner.contract_start, partner.contract_end)?;
        if let Some(notes) = req.notes {
            partner.notes = non_blank(Some(notes.as_str())).map(str::to_string);
        }
        partner.updated_at = self.clock.now();

        self.partners.update_partner(&partner, activation).await?;
        let stored = self.find(id).await?;

        tracing::info!(
            partner_id = %stored.id,
            company_id = %stored.company_id,
            is_active = stored.is_active,
            activation = ?activation,
            "Partner updated"
        );

        Ok(PartnerView::new(stored, today))
    }

    /// Soft delete: the partner stays on record but can no longer authorize.
    pub async fn delete_partner(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.partners.deactivate_partner(id).await? {
            return Err(ServiceError::PartnerNotFound);
        }
        tracing::info!(partner_id = %id, "Partner deactivated");
        Ok(())
    }

    pub async fn get_scopes(&self, id: Uuid) -> Result<Vec<ScopeGrant>, ServiceError> {
        self.find(id).await?;
        self.partners.scopes_for_partner(id).await
    }

    /// All names are checked before anything is written; then every pair is
    /// upserted as one unit.
    pub async fn update_scopes(
        &self,
        id: Uuid,
        items: &[ScopeItem],
    ) -> Result<Vec<ScopeGrant>, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::Validation(
                "at least one scope is required".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            let scope = item
                .scope_name
                .trim()
                .parse::<ScopeName>()
                .map_err(ServiceError::Validation)?;
            if !seen.insert(scope) {
                return Err(ServiceError::Validation(format!(
                    "duplicate scope: {}",
                    scope
                )));
            }
            pairs.push((scope, item.enabled));
        }

        self.find(id).await?;
        self.partners.upsert_scopes(id, &pairs).await?;

        tracing::info!(partner_id = %id, changes = ?pairs, "Partner scopes updated");

        self.partners.scopes_for_partner(id).await
    }

    /// Current credential, unchanged. Repeated calls return the same value.
    pub async fn reveal_api_key(
        &self,
        id: Uuid,
    ) -> Result<PartnerCredentialResponse, ServiceError> {
        let partner = self.find(id).await?;
        tracing::info!(partner_id = %id, "Partner API key revealed");
        let api_key = partner.api_key.clone();
        Ok(self.credential_response(partner, api_key, REVEALED_NOTE))
    }

    /// Replace the credential. The old one fails authorization from the
    /// moment this returns.
    pub async fn reset_api_key(
        &self,
        id: Uuid,
    ) -> Result<PartnerCredentialResponse, ServiceError> {
        let new_api_key = generate_api_key(&self.environment);
        let partner = self
            .partners
            .rotate_api_key(id, &new_api_key)
            .await?
            .ok_or(ServiceError::PartnerNotFound)?;

        tracing::info!(
            partner_id = %id,
            company_id = %partner.company_id,
            "Partner API key rotated"
        );

        Ok(self.credential_response(partner, new_api_key, ROTATED_NOTE))
    }

    async fn find(&self, id: Uuid) -> Result<Partner, ServiceError> {
        self.partners
            .find_partner_by_id(id)
            .await?
            .ok_or(ServiceError::PartnerNotFound)
    }

    fn credential_response(
        &self,
        partner: Partner,
        api_key: String,
        note: &str,
    ) -> PartnerCredentialResponse {
        PartnerCredentialResponse {
            company_id: partner.company_id.clone(),
            contract_start: partner.contract_start,
            contract_end: partner.contract_end,
            api_key,
            note: note.to_string(),
            partner: PartnerView::new(partner, self.clock.today()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
fn parse_contract_date(raw: &str, field: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| {
            ServiceError::Validation(format!("{} must be a date in YYYY-MM-DD format", field))
        })
}

fn one_year_after(start: NaiveDate) -> Result<NaiveDate, ServiceError> {
    start
        .checked_add_months(Months::new(12))
        .ok_or_else(|| ServiceError::Validation("contract_start is out of range".to_string()))
}

fn check_window(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), ServiceError> {
    match end {
        Some(end) if end < start => Err(ServiceError::Validation(
            "contract_end must not be before contract_start".to_string(),
        )),
        _ => Ok(()),
    }
}

fn parse_status(raw: &str) -> Result<bool, ServiceError> {
    match raw.to_lowercase().as_str() {
        "active" | "y" => Ok(true),
        "inactive" | "n" => Ok(false),
        _ => Err(ServiceError::Validation(format!(
            "status must be one of active, inactive, Y, N (got {})",
            raw
        ))),
    }
}

fn parse_scope_names(names: &[String]) -> Result<BTreeSet<ScopeName>, ServiceError> {
    names
        .iter()
        .map(|name| name.trim().parse::<ScopeName>().map_err(ServiceError::Validation))
        .collect()
}
