pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{PartnerConfig, SwaggerMode};
use crate::services::{
    AdminSessionService, AdminStore, AuditRecorder, AuthorizationGate, Clock, DisclosureService,
    JwtService, PartnerAdminService, PartnerStore, WorkerDirectory,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::checking::check_worker,
        handlers::auth::admin_login,
        handlers::admin::partners::create_partner,
        handlers::admin::partners::list_partners,
        handlers::admin::partners::get_partner,
        handlers::admin::partners::update_partner,
        handlers::admin::partners::delete_partner,
        handlers::admin::partners::get_scopes,
        handlers::admin::partners::update_scopes,
        handlers::admin::partners::reveal_api_key,
        handlers::admin::partners::reset_api_key,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::checking::CheckRequest,
            dtos::admin::CreatePartnerRequest,
            dtos::admin::UpdatePartnerRequest,
            dtos::admin::ScopeItem,
            dtos::admin::UpdateScopesRequest,
            dtos::admin::PartnerView,
            dtos::admin::PartnerCredentialResponse,
            dtos::admin::ScopeView,
            dtos::admin::AdminLoginRequest,
            dtos::admin::AdminLoginResponse,
            dtos::admin::AdminSummary,
            services::policy::DisclosureRecord,
            models::Partner,
            models::EffectiveStatus,
            models::ScopeName,
            models::AdminRole,
            models::MembershipStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Checking", description = "Partner worker verification"),
        (name = "Authentication", description = "Admin session login"),
        (name = "Admin", description = "Partner onboarding, scopes and API keys"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document with the partner key scheme bound to the configured header.
pub fn api_doc(api_key_header: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if let Some(components) = doc.components.as_mut() {
        components.add_security_scheme(
            "partner_api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(api_key_header))),
        );
    }
    doc
}

#[derive(Clone)]
pub struct AppState {
    pub config: PartnerConfig,
    pub store: Arc<dyn PartnerStore>,
    pub gate: AuthorizationGate,
    pub disclosure: DisclosureService,
    pub partners: PartnerAdminService,
    pub sessions: AdminSessionService,
}

impl AppState {
    /// Wire the services over the given stores. The audit recorder's writer
    /// task is owned by the caller.
    pub fn new(
        config: PartnerConfig,
        partner_store: Arc<dyn PartnerStore>,
        workers: Arc<dyn WorkerDirectory>,
        admins: Arc<dyn AdminStore>,
        clock: Arc<dyn Clock>,
        audit: AuditRecorder,
    ) -> Result<Self, anyhow::Error> {
        let jwt = JwtService::new(&config.jwt)?;
        let sessions = AdminSessionService::new(admins, jwt)?;
        let gate = AuthorizationGate::new(partner_store.clone(), clock.clone());
        let disclosure = DisclosureService::new(workers, audit, clock.clone());
        let partners =
            PartnerAdminService::new(partner_store.clone(), clock, config.environment.clone());

        Ok(Self {
            config,
            store: partner_store,
            gate,
            disclosure,
            partners,
            sessions,
        })
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Admin routes
    let admin_routes = Router::new()
        .route(
            "/admin/partners",
            post(handlers::admin::create_partner).get(handlers::admin::list_partners),
        )
        .route(
            "/admin/partners/:id",
            get(handlers::admin::get_partner)
                .put(handlers::admin::update_partner)
                .delete(handlers::admin::delete_partner),
        )
        .route(
            "/admin/partners/:id/scopes",
            get(handlers::admin::get_scopes).put(handlers::admin::update_scopes),
        )
        .route(
            "/admin/partners/:id/reveal-api-key",
            get(handlers::admin::reveal_api_key),
        )
        .route(
            "/admin/partners/:id/reset-api-key",
            post(handlers::admin::reset_api_key),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::admin_auth_middleware,
        ));

    // Partner data plane
    let checking_routes = Router::new()
        .route("/api/checking", post(handlers::check_worker))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::partner_key_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/api/v1/auth/admin/login", post(handlers::admin_login))
        .merge(checking_routes)
        .merge(admin_routes);

    let openapi = api_doc(&state.config.partner.api_key_header);
    match state.config.swagger.enabled {
        SwaggerMode::Public => {
            app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", openapi));
        }
        SwaggerMode::Authenticated => {
            let docs: Router<AppState> = SwaggerUi::new("/docs")
                .url("/.well-known/openapi.json", openapi)
                .into();
            app = app.merge(docs.route_layer(from_fn_with_state(
                state.clone(),
                middleware::admin_auth_middleware,
            )));
        }
        SwaggerMode::Disabled => {}
    }

    let mut allowed_headers = vec![header::AUTHORIZATION, header::CONTENT_TYPE];
    match HeaderName::try_from(state.config.partner.api_key_header.as_str()) {
        Ok(name) => allowed_headers.push(name),
        Err(e) => tracing::error!(
            header = %state.config.partner.api_key_header,
            error = %e,
            "Invalid partner API key header name"
        ),
    }

    let app = app
        .with_state(state.clone())
        // Add metrics middleware
        .layer(from_fn(middleware::metrics_middleware))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| match o.parse::<HeaderValue>() {
                            Ok(origin) => Some(origin),
                            Err(e) => {
                                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                                None
                            }
                        })
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(allowed_headers),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Result<service_core::axum::Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::from(e)
    })?;

    Ok(service_core::axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        }
    })))
}
