use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::policy::DisclosureRecord;

/// Body of `POST /api/checking`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckRequest {
    #[validate(length(min = 1, max = 32, message = "nik is required"))]
    #[schema(example = "3174091201900001")]
    pub nik: String,
    #[validate(length(min = 1, message = "tanggal_lahir is required"))]
    #[schema(example = "1990-01-12")]
    pub tanggal_lahir: String,
}

/// Either `{"found": false}` or `found: true` plus the disclosed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub found: bool,
    #[serde(flatten)]
    pub record: Option<DisclosureRecord>,
}

impl CheckOutcome {
    pub fn not_found() -> Self {
        Self {
            found: false,
            record: None,
        }
    }

    pub fn found(record: DisclosureRecord) -> Self {
        Self {
            found: true,
            record: Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_serializes_to_single_key() {
        let value = serde_json::to_value(CheckOutcome::not_found()).unwrap();
        assert_eq!(value, serde_json::json!({ "found": false }));
    }

    #[test]
    fn test_blank_nik_fails_validation() {
        let req = CheckRequest {
            nik: String::new(),
            tanggal_lahir: "1990-01-12".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
