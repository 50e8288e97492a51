use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{AdminPrincipal, AdminRole};

/// `typ` claim carried by control-plane tokens.
pub const ADMIN_TOKEN_TYPE: &str = "admin";

/// JWT service for admin session tokens (HS256).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    admin_token_expiry_minutes: i64,
}

/// Claims for admin session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminTokenClaims {
    /// Subject (admin ID)
    pub sub: String,
    pub username: String,
    pub role: AdminRole,
    /// Token type, always `admin`
    pub typ: String,
    pub iss: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            admin_token_expiry_minutes: config.admin_token_expiry_minutes,
        })
    }

    pub fn generate_admin_token(&self, admin: &AdminPrincipal) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = Duration::try_minutes(self.admin_token_expiry_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Admin token expiry of {} minutes is out of range",
                    self.admin_token_expiry_minutes
                )
            })?;

        let claims = AdminTokenClaims {
            sub: admin.id.to_string(),
            username: admin.username.clone(),
            role: admin.role,
            typ: ADMIN_TOKEN_TYPE.to_string(),
            iss: self.issuer.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode admin token: {}", e))
    }

    /// Decode a bearer token and insist on the admin `typ` claim.
    pub fn validate_admin_token(&self, token: &str) -> Result<AdminTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<AdminTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid admin token: {}", e))?;

        if token_data.claims.typ != ADMIN_TOKEN_TYPE {
            return Err(anyhow::anyhow!(
                "Token type '{}' is not accepted here",
                token_data.claims.typ
            ));
        }

        Ok(token_data.claims)
    }

    pub fn admin_token_expiry_seconds(&self) -> i64 {
        self.admin_token_expiry_minutes.saturating_mul(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: Secret::new(secret.to_string()),
            issuer: "partner-service".to_string(),
            admin_token_expiry_minutes: 15,
        }
    }

    fn admin() -> AdminPrincipal {
        AdminPrincipal {
            id: Uuid::new_v4(),
            username: "root".to_string(),
            password_hash: String::new(),
            role: AdminRole::Superadmin,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_out_of_range_expiry_is_an_error() {
        let mut cfg = config("0123456789abcdef0123456789abcdef");
        cfg.admin_token_expiry_minutes = i64::MAX;
        let jwt = JwtService::new(&cfg).unwrap();
        assert!(jwt.generate_admin_token(&admin()).is_err());
    }

    #[test]
    fn test_admin_token_round_trip() {
        let jwt = JwtService::new(&config("0123456789abcdef0123456789abcdef")).unwrap();
        let principal = admin();
        let token = jwt.generate_admin_token(&principal).unwrap();
        let claims = jwt.validate_admin_token(&token).unwrap();
        assert_eq!(claims.sub, principal.id.to_string());
        assert_eq!(claims.role, AdminRole::Superadmin);
        assert_eq!(claims.typ, ADMIN_TOKEN_TYPE);
    }

    #[test]
    fn test_token_with_other_type_rejected() {
        let jwt = JwtService::new(&config("0123456789abcdef0123456789abcdef")).unwrap();
        let now = Utc::now().timestamp();
        let claims = AdminTokenClaims {
            sub: Uuid::new_v4().to_string(),
            username: "partner".to_string(),
            role: AdminRole::Operator,
            typ: "partner".to_string(),
            iss: "partner-service".to_string(),
            exp: now + 600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert!(jwt.validate_admin_token(&token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let issuer = JwtService::new(&config("one-secret-one-secret-one-secret")).unwrap();
        let verifier = JwtService::new(&config("two-secret-two-secret-two-secret")).unwrap();
        let token = issuer.generate_admin_token(&admin()).unwrap();
        assert!(verifier.validate_admin_token(&token).is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtService::new(&config("")).is_err());
    }
}
