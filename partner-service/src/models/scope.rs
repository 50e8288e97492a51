use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Closed set of disclosable fields a partner can be granted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ScopeName {
    Name,
    TanggalLahir,
    StatusBpjs,
    Alamat,
}

impl ScopeName {
    pub const ALL: [ScopeName; 4] = [
        ScopeName::Name,
        ScopeName::TanggalLahir,
        ScopeName::StatusBpjs,
        ScopeName::Alamat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeName::Name => "name",
            ScopeName::TanggalLahir => "tanggal_lahir",
            ScopeName::StatusBpjs => "status_bpjs",
            ScopeName::Alamat => "alamat",
        }
    }

    /// Scopes granted to a new partner when the request names none.
    pub fn defaults() -> BTreeSet<ScopeName> {
        [ScopeName::Name, ScopeName::TanggalLahir, ScopeName::StatusBpjs]
            .into_iter()
            .collect()
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScopeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ScopeName::Name),
            "tanggal_lahir" => Ok(ScopeName::TanggalLahir),
            "status_bpjs" => Ok(ScopeName::StatusBpjs),
            "alamat" => Ok(ScopeName::Alamat),
            _ => Err(format!("Unknown scope: {}", s)),
        }
    }
}

/// One stored (partner, field) permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScopeGrant {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub scope_name: ScopeName,
    pub enabled: bool,
}

impl ScopeGrant {
    pub fn new(partner_id: Uuid, scope_name: ScopeName, enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            partner_id,
            scope_name,
            enabled,
        }
    }
}

/// Row shape as stored; scope names live in a TEXT column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScopeGrantRow {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub scope_name: String,
    pub enabled: bool,
}

impl TryFrom<ScopeGrantRow> for ScopeGrant {
    type Error = String;

    fn try_from(row: ScopeGrantRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            partner_id: row.partner_id,
            scope_name: row.scope_name.parse()?,
            enabled: row.enabled,
        })
    }
}

/// Enabled scope names drawn from a partner's grants.
pub fn enabled_scopes(grants: &[ScopeGrant]) -> BTreeSet<ScopeName> {
    grants
        .iter()
        .filter(|g| g.enabled)
        .map(|g| g.scope_name)
        .collect()
}
