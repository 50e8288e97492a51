//! Field-level projection of worker records.
//!
//! The projection is an allow-list: `DisclosureRecord` can only carry the
//! fields named here, and each optional field is filled from exactly one
//! scope. A new column on `WorkerRecord` cannot reach a partner without a
//! new scope and a new arm below.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use utoipa::ToSchema;

use crate::models::{MembershipStatus, ScopeName, WorkerRecord};

/// What a partner is allowed to see of one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisclosureRecord {
    pub nik: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nama: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tanggal_lahir: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_kepesertaan: Option<MembershipStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alamat: Option<String>,
    pub last_update: DateTime<Utc>,
}

impl DisclosureRecord {
    /// Names of the fields present in the serialized form.
    pub fn field_names(&self) -> BTreeSet<&'static str> {
        let mut names: BTreeSet<&'static str> = ["nik", "last_update"].into_iter().collect();
        if self.nama.is_some() {
            names.insert("nama");
        }
        if self.tanggal_lahir.is_some() {
            names.insert("tanggal_lahir");
        }
        if self.status_kepesertaan.is_some() {
            names.insert("status_kepesertaan");
        }
        if self.alamat.is_some() {
            names.insert("alamat");
        }
        names
    }
}

/// Response field produced by each scope.
pub fn disclosed_field(scope: ScopeName) -> &'static str {
    match scope {
        ScopeName::Name => "nama",
        ScopeName::TanggalLahir => "tanggal_lahir",
        ScopeName::StatusBpjs => "status_kepesertaan",
        ScopeName::Alamat => "alamat",
    }
}

/// Project `record` down to `allowed`. `nik` and `last_update` are always
/// present; null values stay absent even when their scope is granted.
pub fn project(record: &WorkerRecord, allowed: &BTreeSet<ScopeName>) -> DisclosureRecord {
    let mut disclosed = DisclosureRecord {
        nik: record.nik.clone(),
        nama: None,
        tanggal_lahir: None,
        status_kepesertaan: None,
        alamat: None,
        last_update: record.updated_at,
    };

    for scope in allowed {
        match scope {
            ScopeName::Name => disclosed.nama = Some(record.nama.clone()),
            ScopeName::TanggalLahir => disclosed.tanggal_lahir = Some(record.tanggal_lahir),
            ScopeName::StatusBpjs => {
                disclosed.status_kepesertaan = Some(record.status_kepesertaan)
            }
            ScopeName::Alamat => disclosed.alamat = record.alamat.clone(),
        }
    }

    disclosed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(alamat: Option<&str>) -> WorkerRecord {
        WorkerRecord {
            nik: "X".to_string(),
            nama: "Ana".to_string(),
            tanggal_lahir: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            alamat: alamat.map(str::to_string),
            status_kepesertaan: MembershipStatus::Aktif,
            updated_at: DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn json_keys(disclosed: &DisclosureRecord) -> BTreeSet<String> {
        serde_json::to_value(disclosed)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn test_name_only_discloses_nama() {
        let allowed: BTreeSet<ScopeName> = [ScopeName::Name].into_iter().collect();
        let disclosed = project(&record(Some("Jl. A")), &allowed);

        let value = serde_json::to_value(&disclosed).unwrap();
        assert_eq!(value["nik"], "X");
        assert_eq!(value["nama"], "Ana");
        assert!(value.get("alamat").is_none());
        assert!(value.get("status_kepesertaan").is_none());
        assert_eq!(
            json_keys(&disclosed),
            ["last_update", "nama", "nik"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[test]
    fn test_keys_match_allowed_set_for_every_subset() {
        let full = record(Some("Jl. A"));
        for mask in 0u8..16 {
            let allowed: BTreeSet<ScopeName> = ScopeName::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, s)| s)
                .collect();

            let mut expected: BTreeSet<String> =
                ["nik", "last_update"].into_iter().map(String::from).collect();
            expected.extend(allowed.iter().map(|s| disclosed_field(*s).to_string()));

            let disclosed = project(&full, &allowed);
            assert_eq!(json_keys(&disclosed), expected, "mask {:04b}", mask);
            assert_eq!(
                disclosed
                    .field_names()
                    .into_iter()
                    .map(String::from)
                    .collect::<BTreeSet<_>>(),
                expected
            );
        }
    }

    #[test]
    fn test_null_alamat_omitted_even_when_granted() {
        let allowed: BTreeSet<ScopeName> = ScopeName::ALL.into_iter().collect();
        let disclosed = project(&record(None), &allowed);
        assert!(disclosed.alamat.is_none());
        assert!(!json_keys(&disclosed).contains("alamat"));
    }

    #[test]
    fn test_empty_scope_set_discloses_identity_only() {
        let disclosed = project(&record(Some("Jl. A")), &BTreeSet::new());
        assert_eq!(disclosed.field_names().len(), 2);
        let value = serde_json::to_value(&disclosed).unwrap();
        assert_eq!(value["tanggal_lahir"], serde_json::Value::Null);
    }
}
