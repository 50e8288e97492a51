use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use uuid::Uuid;

use crate::config::Environment;

pub const LIVE_KEY_PREFIX: &str = "pk_live_";
pub const TEST_KEY_PREFIX: &str = "pk_test_";

/// Random bytes, URL-safe base64 without padding.
pub fn generate_random_encoded_bytes(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Fresh partner credential, prefixed by environment.
pub fn generate_api_key(environment: &Environment) -> String {
    let prefix = match environment {
        Environment::Prod => LIVE_KEY_PREFIX,
        Environment::Dev => TEST_KEY_PREFIX,
    };
    format!("{}{}", prefix, generate_random_encoded_bytes(32))
}

pub fn has_api_key_prefix(key: &str) -> bool {
    key.starts_with(LIVE_KEY_PREFIX) || key.starts_with(TEST_KEY_PREFIX)
}

/// `PT-<3 chars of the first word>-<3 hex>`, e.g. `PT-MAJ-4F1`.
pub fn generate_company_id(company_name: &str) -> String {
    let word: String = company_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect();
    let code = format!("{:X<3}", word);
    let suffix = Uuid::new_v4().simple().to_string()[..3].to_uppercase();
    format!("PT-{}-{}", code, suffix)
}

/// Contract number `PKS-<year>-<8 hex>`.
pub fn generate_pks_number(year: i32) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("PKS-{}-{}", year, suffix)
}
