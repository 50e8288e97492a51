use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{enabled_scopes, ScopeName};
use crate::services::clock::Clock;
use crate::services::error::Rejection;
use crate::services::metrics::record_authorization;
use crate::services::store::PartnerStore;
use crate::services::ServiceError;
use crate::utils::generator::has_api_key_prefix;

/// Result of a successful gate check. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub partner_id: Uuid,
    pub company_id: String,
    pub allowed_scopes: BTreeSet<ScopeName>,
}

/// Turns a raw partner credential into an [`AuthorizationContext`].
#[derive(Clone)]
pub struct AuthorizationGate {
    partners: Arc<dyn PartnerStore>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationGate {
    pub fn new(partners: Arc<dyn PartnerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { partners, clock }
    }

    /// Check order: presence, lookup, stored flag, contract window, scopes.
    ///
    /// An elapsed contract flips the partner to inactive before rejecting, so
    /// later attempts stop at the stored flag.
    pub async fn authorize(
        &self,
        raw_credential: Option<&str>,
    ) -> Result<AuthorizationContext, ServiceError> {
        match self.evaluate(raw_credential).await {
            Ok(context) => {
                record_authorization("authorized");
                Ok(context)
            }
            Err(ServiceError::Rejected(reason)) => {
                tracing::warn!(reason = %reason, "Partner authorization rejected");
                record_authorization(reason.as_str());
                Err(ServiceError::Rejected(reason))
            }
            Err(e) => {
                tracing::error!(error = %e, "Partner authorization failed");
                Err(e)
            }
        }
    }

    async fn evaluate(
        &self,
        raw_credential: Option<&str>,
    ) -> Result<AuthorizationContext, ServiceError> {
        let credential = raw_credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ServiceError::Rejected(Rejection::MissingCredential))?;

        if !has_api_key_prefix(credential) {
            return Err(ServiceError::Rejected(Rejection::InvalidCredential));
        }

        let partner = self
            .partners
            .find_partner_by_api_key(credential)
            .await?
            .ok_or(ServiceError::Rejected(Rejection::InvalidCredential))?;

        if !partner.is_active {
            return Err(ServiceError::Rejected(Rejection::PartnerInactive));
        }

        let today = self.clock.today();
        if partner.contract_pending(today) {
            return Err(ServiceError::Rejected(Rejection::ContractNotStarted));
        }
        if partner.contract_elapsed(today) {
            if self.partners.expire_partner(partner.id, today).await?.is_some() {
                tracing::info!(
                    partner_id = %partner.id,
                    company_id = %partner.company_id,
                    contract_end = ?partner.contract_end,
                    "Partner contract elapsed, marked inactive"
                );
            }
            return Err(ServiceError::Rejected(Rejection::ContractExpired));
        }

        let grants = self.partners.scopes_for_partner(partner.id).await?;

        Ok(AuthorizationContext {
            partner_id: partner.id,
            company_id: partner.company_id,
            allowed_scopes: enabled_scopes(&grants),
        })
    }
}
