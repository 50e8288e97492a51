//! Services layer for partner-service.
//!
//! The authorization gate, the scope policy, disclosure, the audit trail and
//! the admin-side lifecycle of partners, all behind the store traits.

pub mod audit;
pub mod clock;
mod database;
pub mod disclosure;
pub mod error;
pub mod gate;
pub mod jwt;
mod memory;
pub mod metrics;
pub mod partners;
pub mod policy;
pub mod session;
pub mod store;

pub use audit::AuditRecorder;
pub use clock::{Clock, FixedClock, SystemClock};
pub use database::Database;
pub use disclosure::DisclosureService;
pub use error::{Rejection, ServiceError};
pub use gate::{AuthorizationContext, AuthorizationGate};
pub use jwt::{AdminTokenClaims, JwtService};
pub use memory::MemoryStore;
pub use partners::PartnerAdminService;
pub use session::AdminSessionService;
pub use store::{AdminStore, AuditSink, PartnerStore, WorkerDirectory};
