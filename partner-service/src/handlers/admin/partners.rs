use service_core::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        admin::{CreatePartnerRequest, ScopeView, UpdatePartnerRequest, UpdateScopesRequest},
        ApiResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Onboard a partner and issue its API key
#[utoipa::path(
    post,
    path = "/admin/partners",
    request_body = CreatePartnerRequest,
    responses(
        (status = 201, description = "Partner created; the response carries the API key", body = PartnerCredentialResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Company ID already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_partner(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePartnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.partners.create_partner(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Partner created successfully", res)),
    ))
}

/// List all partners
#[utoipa::path(
    get,
    path = "/admin/partners",
    responses(
        (status = 200, description = "Partners with their effective status", body = [PartnerView]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_partners(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let partners = state.partners.list_partners().await?;
    Ok(Json(ApiResponse::data(partners)))
}

/// Get one partner
#[utoipa::path(
    get,
    path = "/admin/partners/{id}",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Partner found", body = PartnerView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let partner = state.partners.get_partner(id).await?;
    Ok(Json(ApiResponse::data(partner)))
}

/// Update partner details, status or contract window
#[utoipa::path(
    put,
    path = "/admin/partners/{id}",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    request_body = UpdatePartnerRequest,
    responses(
        (status = 200, description = "Partner updated", body = PartnerView),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse),
        (status = 409, description = "Company ID already exists", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePartnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let partner = state.partners.update_partner(id, req).await?;
    Ok(Json(ApiResponse::with_message(
        "Partner updated successfully",
        partner,
    )))
}

/// Deactivate a partner (soft delete)
#[utoipa::path(
    delete,
    path = "/admin/partners/{id}",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Partner deactivated"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.partners.delete_partner(id).await?;
    Ok(Json(ApiResponse::message("Partner deactivated successfully")))
}

/// Get the scope grants of a partner
#[utoipa::path(
    get,
    path = "/admin/partners/{id}/scopes",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Scope grants", body = [ScopeView]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_scopes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scopes: Vec<ScopeView> = state
        .partners
        .get_scopes(id)
        .await?
        .into_iter()
        .map(ScopeView::from)
        .collect();
    Ok(Json(ApiResponse::data(scopes)))
}

/// Enable or disable scopes; all changes apply or none do
#[utoipa::path(
    put,
    path = "/admin/partners/{id}/scopes",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    request_body = UpdateScopesRequest,
    responses(
        (status = 200, description = "Scopes updated", body = [ScopeView]),
        (status = 400, description = "Unknown or duplicate scope", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_scopes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateScopesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let scopes: Vec<ScopeView> = state
        .partners
        .update_scopes(id, &req.scopes)
        .await?
        .into_iter()
        .map(ScopeView::from)
        .collect();
    Ok(Json(ApiResponse::with_message(
        "Scopes updated successfully",
        scopes,
    )))
}

/// Show the partner's current API key without changing it
#[utoipa::path(
    get,
    path = "/admin/partners/{id}/reveal-api-key",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "Current API key", body = PartnerCredentialResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reveal_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.partners.reveal_api_key(id).await?;
    Ok(Json(ApiResponse::data(res)))
}

/// Rotate the partner's API key; the previous key stops working
#[utoipa::path(
    post,
    path = "/admin/partners/{id}/reset-api-key",
    params(
        ("id" = Uuid, Path, description = "Partner ID")
    ),
    responses(
        (status = 200, description = "New API key", body = PartnerCredentialResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Partner not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reset_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.partners.reset_api_key(id).await?;
    Ok(Json(ApiResponse::with_message(
        "API key reset successfully",
        res,
    )))
}
