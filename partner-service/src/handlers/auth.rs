use service_core::axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{admin::AdminLoginRequest, ApiResponse},
    utils::{Password, ValidatedJson},
    AppState,
};

/// Admin login with username and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .sessions
        .login(&req.username, Password::new(req.password))
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::with_message("Login successful", res))))
}
