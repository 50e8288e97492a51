use service_core::error::AppError;
use std::fmt;
use thiserror::Error;

/// Why the authorization gate turned a caller away.
///
/// Each reason is kept distinct for logs and metrics; callers on the data
/// plane only ever see one of two generic messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingCredential,
    InvalidCredential,
    PartnerInactive,
    ContractNotStarted,
    ContractExpired,
}

impl Rejection {
    /// Credential problems (401) as opposed to authorization problems (403).
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Rejection::MissingCredential | Rejection::InvalidCredential
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingCredential => "missing_credential",
            Rejection::InvalidCredential => "invalid_credential",
            Rejection::PartnerInactive => "partner_inactive",
            Rejection::ContractNotStarted => "contract_not_started",
            Rejection::ContractExpired => "contract_expired",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CREDENTIAL_REJECTED_MESSAGE: &str = "Invalid or missing API key";
pub const PARTNER_NOT_AUTHORIZED_MESSAGE: &str = "Partner is not authorized to access this resource";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Request rejected: {0}")]
    Rejected(Rejection),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Partner not found")]
    PartnerNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Rejected(reason) if reason.is_credential() => {
                AppError::Unauthorized(anyhow::anyhow!(CREDENTIAL_REJECTED_MESSAGE))
            }
            ServiceError::Rejected(_) => {
                AppError::Forbidden(anyhow::anyhow!(PARTNER_NOT_AUTHORIZED_MESSAGE))
            }
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Conflict(e) => AppError::Conflict(anyhow::anyhow!(e)),
            ServiceError::PartnerNotFound => {
                AppError::NotFound(anyhow::anyhow!("Partner not found"))
            }
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid username or password"))
            }
            ServiceError::InvalidToken => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
