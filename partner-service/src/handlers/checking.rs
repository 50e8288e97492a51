use service_core::axum::{extract::State, response::IntoResponse, Extension, Json};
use service_core::error::AppError;

use crate::{
    dtos::{checking::CheckRequest, ApiResponse},
    services::AuthorizationContext,
    utils::ValidatedJson,
    AppState,
};

const FOUND_MESSAGE: &str = "TK data found and verified";
const NOT_FOUND_MESSAGE: &str = "TK data not found or date of birth mismatch";

/// Verify a worker by NIK and date of birth, disclosing only granted fields
#[utoipa::path(
    post,
    path = "/api/checking",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Lookup completed; `data.found` tells whether the worker matched"),
        (status = 400, description = "Malformed body or date", body = ErrorResponse),
        (status = 401, description = "Invalid or missing API key", body = ErrorResponse),
        (status = 403, description = "Partner is not authorized to access this resource", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Checking",
    security(
        ("partner_api_key" = [])
    )
)]
pub async fn check_worker(
    State(state): State<AppState>,
    Extension(context): Extension<AuthorizationContext>,
    ValidatedJson(req): ValidatedJson<CheckRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.disclosure.check(&context, &req).await?;
    let message = if outcome.found {
        FOUND_MESSAGE
    } else {
        NOT_FOUND_MESSAGE
    };
    Ok(Json(ApiResponse::with_message(message, outcome)))
}
