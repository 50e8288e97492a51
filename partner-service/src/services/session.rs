use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::dtos::admin::{AdminLoginResponse, AdminSummary};
use crate::models::{AdminPrincipal, AdminRole};
use crate::services::jwt::JwtService;
use crate::services::store::AdminStore;
use crate::services::ServiceError;
use crate::utils::generator::generate_random_encoded_bytes;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Control-plane login. Admin sessions never touch the partner data plane.
#[derive(Clone)]
pub struct AdminSessionService {
    admins: Arc<dyn AdminStore>,
    jwt: JwtService,
    /// Verified against when the username is unknown, so both failure paths
    /// cost one Argon2 verification.
    decoy_hash: PasswordHashString,
}

impl AdminSessionService {
    pub fn new(admins: Arc<dyn AdminStore>, jwt: JwtService) -> Result<Self, anyhow::Error> {
        let decoy_hash = hash_password(&Password::new(generate_random_encoded_bytes(24)))?;
        Ok(Self {
            admins,
            jwt,
            decoy_hash,
        })
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn login(
        &self,
        username: &str,
        password: Password,
    ) -> Result<AdminLoginResponse, ServiceError> {
        let admin = self.admins.find_admin_by_username(username.trim()).await?;

        let stored_hash = admin
            .as_ref()
            .map(|a| PasswordHashString::new(a.password_hash.clone()))
            .unwrap_or_else(|| self.decoy_hash.clone());
        let verified = verify_password(&password, &stored_hash).is_ok();

        let admin = match admin {
            Some(admin) if verified && admin.is_active => admin,
            Some(admin) if verified => {
                tracing::warn!(admin_id = %admin.id, "Login attempt for disabled admin");
                return Err(ServiceError::InvalidCredentials);
            }
            _ => {
                tracing::warn!("Admin login failed");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = self
            .jwt
            .generate_admin_token(&admin)
            .map_err(ServiceError::Internal)?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");

        Ok(AdminLoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.admin_token_expiry_seconds(),
            admin: AdminSummary {
                id: admin.id,
                username: admin.username,
                role: admin.role,
            },
        })
    }

    /// Create the first superadmin when the username is free. Returns whether
    /// an account was created.
    pub async fn ensure_superadmin(
        &self,
        username: &str,
        password: Password,
    ) -> Result<bool, ServiceError> {
        let username = username.trim();
        if username.is_empty() || password.expose().is_empty() {
            return Err(ServiceError::Validation(
                "bootstrap admin username and password must not be empty".to_string(),
            ));
        }

        if self.admins.find_admin_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(&password).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let admin = AdminPrincipal {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.into_string(),
            role: AdminRole::Superadmin,
            is_active: true,
            created_at: Utc::now(),
        };

        match self.admins.insert_admin(&admin).await {
            Ok(()) => {
                tracing::info!(
                    admin_id = %admin.id,
                    username = %admin.username,
                    "Bootstrap admin created"
                );
                Ok(true)
            }
            // Another instance won the race.
            Err(ServiceError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
