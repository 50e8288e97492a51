pub mod partners;

pub use partners::{
    create_partner, delete_partner, get_partner, get_scopes, list_partners, reset_api_key,
    reveal_api_key, update_partner, update_scopes,
};
