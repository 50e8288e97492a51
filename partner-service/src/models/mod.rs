pub mod admin;
pub mod audit;
pub mod partner;
pub mod scope;
pub mod worker;

pub use admin::{AdminPrincipal, AdminRole, AdminRow};
pub use audit::AuditEntry;
pub use partner::{ActivationChange, EffectiveStatus, Partner};
pub use scope::{enabled_scopes, ScopeGrant, ScopeGrantRow, ScopeName};
pub use worker::{MembershipStatus, WorkerRecord, WorkerRow};
