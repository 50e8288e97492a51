use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Aktif,
    Nonaktif,
    Unknown,
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MembershipStatus::Aktif => write!(f, "aktif"),
            MembershipStatus::Nonaktif => write!(f, "nonaktif"),
            MembershipStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aktif" => Ok(MembershipStatus::Aktif),
            "nonaktif" => Ok(MembershipStatus::Nonaktif),
            "unknown" => Ok(MembershipStatus::Unknown),
            _ => Err(format!("Invalid membership status: {}", s)),
        }
    }
}

/// Worker (tenaga kerja) record held in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
    pub nik: String,
    pub nama: String,
    pub tanggal_lahir: NaiveDate,
    pub alamat: Option<String>,
    pub status_kepesertaan: MembershipStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkerRow {
    pub nik: String,
    pub nama: String,
    pub tanggal_lahir: NaiveDate,
    pub alamat: Option<String>,
    pub status_kepesertaan: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<WorkerRow> for WorkerRecord {
    type Error = String;

    fn try_from(row: WorkerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            nik: row.nik,
            nama: row.nama,
            tanggal_lahir: row.tanggal_lahir,
            alamat: row.alamat,
            status_kepesertaan: row.status_kepesertaan.parse()?,
            updated_at: row.updated_at,
        })
    }
}
