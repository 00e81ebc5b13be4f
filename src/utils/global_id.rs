//! Relay-style global identifiers
//!
//! A global id is the base64 encoding of `"<TypeName>:<local id>"`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::MutationError;

pub fn to_global_id(type_name: &str, id: impl std::fmt::Display) -> String {
    STANDARD.encode(format!("{}:{}", type_name, id))
}

/// Split a global id into its type name and local id
pub fn from_global_id(global_id: &str) -> Result<(String, String), MutationError> {
    let invalid = || MutationError::InvalidGlobalId(global_id.to_string());
    let bytes = STANDARD.decode(global_id.trim()).map_err(|_| invalid())?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;
    match decoded.split_once(':') {
        Some((type_name, id)) if !type_name.is_empty() && !id.is_empty() => {
            Ok((type_name.to_string(), id.to_string()))
        }
        _ => Err(invalid()),
    }
}

pub fn from_gid_or_none(global_id: Option<&str>) -> Option<(String, String)> {
    global_id
        .filter(|gid| !gid.is_empty())
        .and_then(|gid| from_global_id(gid).ok())
}

/// Accepts either a plain integer or a global id wrapping one
pub fn gid_to_int(gid: &str) -> Option<i64> {
    gid.trim().parse().ok().or_else(|| {
        from_global_id(gid)
            .ok()
            .and_then(|(_, id)| id.parse().ok())
    })
}
