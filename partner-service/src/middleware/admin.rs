use service_core::axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::services::ServiceError;
use crate::AppState;

/// Require `Authorization: Bearer <token>` carrying an admin session token.
/// The decoded claims are stored as a request extension.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Admin request without bearer token");
            AppError::from(ServiceError::InvalidToken)
        })?;

    let claims = state.sessions.jwt().validate_admin_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Failed admin authentication attempt");
        AppError::from(ServiceError::InvalidToken)
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
