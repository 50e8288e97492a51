use service_core::axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::AppState;

/// Resolve the partner credential header into an `AuthorizationContext`
/// request extension. Every rejection maps to one of two generic bodies.
pub async fn partner_key_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = req
        .headers()
        .get(state.config.partner.api_key_header.as_str())
        .and_then(|value| value.to_str().ok());

    let context = state.gate.authorize(credential).await?;

    tracing::debug!(
        partner_id = %context.partner_id,
        company_id = %context.company_id,
        "Partner authorized"
    );

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
