use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorResponse;

pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let err_resp = ErrorResponse::new(format!("Json parse error: {}", e));
            (StatusCode::BAD_REQUEST, Json(err_resp)).into_response()
        })?;

        value.validate().map_err(|e| {
            let err_resp = ErrorResponse::new(format!("Validation error: {}", e));
            (StatusCode::BAD_REQUEST, Json(err_resp)).into_response()
        })?;

        Ok(ValidatedJson(value))
    }
}

pub const MAX_PHONE_DIGITS: usize = 13;

/// Strip the separators people type into phone numbers.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

/// Digits only after normalisation, at most 13 of them. Empty is allowed.
pub fn validate_phone(phone: &str) -> Result<String, String> {
    let cleaned = normalize_phone(phone);
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err("pic_phone must contain only digits".to_string());
    }
    if cleaned.len() > MAX_PHONE_DIGITS {
        return Err(format!(
            "pic_phone must be at most {} digits",
            MAX_PHONE_DIGITS
        ));
    }
    Ok(cleaned)
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.contains('@') && email.contains('.') {
        Ok(())
    } else {
        Err("pic_email must be a valid email address".to_string())
    }
}

/// Trimmed value, or an error naming the blank field.
pub fn required(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(trimmed.to_string())
    }
}
