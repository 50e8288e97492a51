use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A consuming organization and its single active credential.
///
/// The credential is stored recoverable (not hashed) so that admins can
/// reveal the current value without rotating it. It is never serialized
/// with the partner itself.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Partner {
    pub id: Uuid,
    pub company_name: String,
    pub company_id: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub nomor_pks: String,
    pub pic_name: String,
    pub pic_email: String,
    pub pic_phone: String,
    pub is_active: bool,
    /// Set by an admin disable or delete, cleared by an admin enable or a new
    /// contract end. Lazy expiry never touches it.
    pub disabled_by_admin: bool,
    pub contract_start: NaiveDate,
    pub contract_end: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Active-flag change carried by an admin edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationChange {
    /// Explicit `status`: enable or disable by hand.
    Manual(bool),
    /// A new contract end decided the flag.
    Contract(bool),
}

impl ActivationChange {
    pub fn is_active(self) -> bool {
        match self {
            ActivationChange::Manual(active) | ActivationChange::Contract(active) => active,
        }
    }

    pub fn disabled_by_admin(self) -> bool {
        self == ActivationChange::Manual(false)
    }
}

/// Authorization state derived from the stored flags and the contract window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    PendingStart,
    Active,
    Expired,
    ManuallyDisabled,
}

impl Partner {
    pub fn contract_elapsed(&self, today: NaiveDate) -> bool {
        self.contract_end.is_some_and(|end| today > end)
    }

    pub fn contract_pending(&self, today: NaiveDate) -> bool {
        today < self.contract_start
    }

    /// A manual disable wins over every date-derived state. Otherwise an
    /// inactive partner whose end date has passed reads as expired.
    pub fn effective_status(&self, today: NaiveDate) -> EffectiveStatus {
        if self.disabled_by_admin {
            EffectiveStatus::ManuallyDisabled
        } else if !self.is_active {
            if self.contract_elapsed(today) {
                EffectiveStatus::Expired
            } else {
                EffectiveStatus::ManuallyDisabled
            }
        } else if self.contract_pending(today) {
            EffectiveStatus::PendingStart
        } else if self.contract_elapsed(today) {
            EffectiveStatus::Expired
        } else {
            EffectiveStatus::Active
        }
    }

    pub fn status_display(&self) -> &'static str {
        if self.is_active {
            "active"
        } else {
            "inactive"
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::partner;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_effective_status_follows_window() {
        let p = partner(date(2024, 1, 10), Some(date(2025, 1, 10)), true);
        assert_eq!(p.effective_status(date(2024, 1, 9)), EffectiveStatus::PendingStart);
        assert_eq!(p.effective_status(date(2024, 1, 10)), EffectiveStatus::Active);
        assert_eq!(p.effective_status(date(2025, 1, 10)), EffectiveStatus::Active);
        assert_eq!(p.effective_status(date(2025, 1, 11)), EffectiveStatus::Expired);
    }

    #[test]
    fn test_manual_disable_outlasts_contract_end() {
        let p = partner(date(2024, 1, 10), Some(date(2025, 1, 10)), false);
        assert_eq!(
            p.effective_status(date(2024, 6, 1)),
            EffectiveStatus::ManuallyDisabled
        );
        assert_eq!(
            p.effective_status(date(2025, 2, 1)),
            EffectiveStatus::ManuallyDisabled
        );
    }

    #[test]
    fn test_lazily_expired_partner_reads_as_expired() {
        let mut p = partner(date(2024, 1, 10), Some(date(2025, 1, 10)), true);
        p.is_active = false;
        assert_eq!(p.effective_status(date(2025, 2, 1)), EffectiveStatus::Expired);
    }

    #[test]
    fn test_activation_change_marks_only_manual_disable() {
        assert!(ActivationChange::Manual(false).disabled_by_admin());
        assert!(!ActivationChange::Manual(true).disabled_by_admin());
        assert!(!ActivationChange::Contract(false).disabled_by_admin());
        assert!(!ActivationChange::Contract(false).is_active());
    }

    #[test]
    fn test_open_ended_contract_never_elapses() {
        let p = partner(date(2024, 1, 10), None, true);
        assert!(!p.contract_elapsed(date(2099, 12, 31)));
        assert_eq!(p.effective_status(date(2099, 12, 31)), EffectiveStatus::Active);
    }

    #[test]
    fn test_api_key_never_serialized() {
        let p = partner(date(2024, 1, 10), None, true);
        let value = serde_json::to_value(&p).unwrap();
        assert!(value.get("api_key").is_none());
        assert_eq!(value["contract_start"], "2024-01-10");
    }
}
