mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{date, TestApp, JWT_SECRET};
use jsonwebtoken::{encode, EncodingKey, Header};
use partner_service::models::AdminRole;
use partner_service::services::AdminTokenClaims;
use serde_json::{json, Value};

const NIK: &str = "3174091201900001";

fn partner_body() -> Value {
    json!({
        "company_name": "Maju Jaya",
        "pic_name": "Budi",
        "pic_email": "budi@majujaya.co.id",
        "pic_phone": "(021) 555-1234",
    })
}

fn enabled(scopes: &Value) -> Vec<String> {
    let mut names: Vec<String> = scopes
        .as_array()
        .expect("scope list")
        .iter()
        .filter(|s| s["enabled"] == true)
        .map(|s| s["scope_name"].as_str().expect("name").to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_create_partner_returns_key_and_defaults() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;

    let (status, body) = app
        .admin(&token, "POST", "/admin/partners", Some(partner_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let data = &body["data"];
    assert!(data["api_key"].as_str().unwrap().starts_with("pk_test_"));
    assert!(data["company_id"].as_str().unwrap().starts_with("PT-MAJ-"));
    assert_eq!(data["contract_start"], "2024-03-01");
    assert_eq!(data["contract_end"], "2025-03-01");
    assert_eq!(data["partner"]["status_display"], "active");
    assert_eq!(data["partner"]["effective_status"], "active");
    assert_eq!(data["partner"]["pic_phone"], "0215551234");
    // The credential is never part of the partner object itself.
    assert!(data["partner"].get("api_key").is_none());

    let id = data["partner"]["id"].as_str().unwrap();
    let (status, scopes) = app
        .admin(&token, "GET", &format!("/admin/partners/{}/scopes", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        enabled(&scopes["data"]),
        vec!["name", "status_bpjs", "tanggal_lahir"]
    );
}

#[tokio::test]
async fn test_create_validation_and_conflicts() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;

    let (status, _) = app
        .admin(
            &token,
            "POST",
            "/admin/partners",
            Some(json!({ "company_name": "X", "pic_name": "Y", "pic_email": "not-an-email" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .admin(
            &token,
            "POST",
            "/admin/partners",
            Some(json!({
                "company_name": "X",
                "pic_name": "Y",
                "pic_email": "y@x.id",
                "pic_phone": "08123456789012345",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({
        "company_name": "X",
        "company_id": "PT-XXX-001",
        "pic_name": "Y",
        "pic_email": "y@x.id",
    });
    app.create_partner(&token, body.clone()).await;
    let (status, _) = app.admin(&token, "POST", "/admin/partners", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reset_api_key_invalidates_old_key() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let (id, old_key) = app.create_partner(&token, partner_body()).await;

    let (status, body) = app
        .admin(&token, "POST", &format!("/admin/partners/{}/reset-api-key", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["data"]["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    assert_eq!(
        app.check(Some(&old_key), NIK, "1990-01-12").await.0,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.check(Some(&new_key), NIK, "1990-01-12").await.0,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_reveal_returns_current_key_without_changing_it() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let (id, key) = app.create_partner(&token, partner_body()).await;
    let uri = format!("/admin/partners/{}/reveal-api-key", id);

    let (_, first) = app.admin(&token, "GET", &uri, None).await;
    let (_, second) = app.admin(&token, "GET", &uri, None).await;
    assert_eq!(first["data"]["api_key"], key.as_str());
    assert_eq!(second["data"]["api_key"], key.as_str());
    assert_eq!(app.check(Some(&key), NIK, "1990-01-12").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_scope_update_with_unknown_name_changes_nothing() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let (id, key) = app.create_partner(&token, partner_body()).await;
    let uri = format!("/admin/partners/{}/scopes", id);

    let (status, _) = app
        .admin(
            &token,
            "PUT",
            &uri,
            Some(json!({ "scopes": [
                { "scope_name": "alamat", "enabled": true },
                { "scope_name": "gaji", "enabled": true },
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, scopes) = app.admin(&token, "GET", &uri, None).await;
    assert!(!enabled(&scopes["data"]).contains(&"alamat".to_string()));

    let (status, body) = app
        .admin(
            &token,
            "PUT",
            &uri,
            Some(json!({ "scopes": [
                { "scope_name": "alamat", "enabled": true },
                { "scope_name": "tanggal_lahir", "enabled": false },
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(enabled(&body["data"]), vec!["alamat", "name", "status_bpjs"]);

    // The next authorization sees the new grants.
    let (_, check) = app.check(Some(&key), NIK, "1990-01-12").await;
    assert_eq!(check["data"]["alamat"], "Jl. Melati No. 5, Jakarta");
    assert!(check["data"].get("tanggal_lahir").is_none());
}

#[tokio::test]
async fn test_empty_scope_list_is_rejected() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let (id, _) = app.create_partner(&token, partner_body()).await;

    let (status, _) = app
        .admin(
            &token,
            "PUT",
            &format!("/admin/partners/{}/scopes", id),
            Some(json!({ "scopes": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_update_and_soft_delete() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let (id, key) = app.create_partner(&token, partner_body()).await;
    let uri = format!("/admin/partners/{}", id);

    let (status, list) = app.admin(&token, "GET", "/admin/partners", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let (status, updated) = app
        .admin(&token, "PUT", &uri, Some(json!({ "pic_name": "Sari", "notes": "renewed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["pic_name"], "Sari");
    assert_eq!(updated["data"]["notes"], "renewed");
    assert_eq!(updated["data"]["is_active"], true);

    let (status, _) = app.admin(&token, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, partner) = app.admin(&token, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(partner["data"]["effective_status"], "manually_disabled");
    assert_eq!(
        app.check(Some(&key), NIK, "1990-01-12").await.0,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_unknown_partner_is_not_found() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let uri = format!("/admin/partners/{}", uuid::Uuid::new_v4());

    let (status, body) = app.admin(&token, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_admin_routes_require_admin_token() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;

    let (status, _) = app.send("GET", "/admin/partners", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.admin("garbage", "GET", "/admin/partners", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correctly signed, but not an admin session token.
    let now = Utc::now().timestamp();
    let claims = AdminTokenClaims {
        sub: uuid::Uuid::new_v4().to_string(),
        username: "someone".to_string(),
        role: AdminRole::Superadmin,
        typ: "access".to_string(),
        iss: "partner-service".to_string(),
        exp: now + 600,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let (status, _) = app.admin(&forged, "GET", "/admin/partners", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_partner_key_is_not_an_admin_credential() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;
    let token = app.admin_token().await;
    let (_, key) = app.create_partner(&token, partner_body()).await;

    let (status, _) = app.admin(&key, "GET", "/admin/partners", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::spawn(date(2024, 3, 1)).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/auth/admin/login",
            &[],
            Some(json!({ "username": "root", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");
}
