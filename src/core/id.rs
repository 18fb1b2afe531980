//! Opaque identifier generation

use crate::crypto::sha256;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

static ID_NONCE: AtomicU64 = AtomicU64::new(0);

/// Generate a unique id for an entity of `kind` owned by `owner`
///
/// Id = hex(SHA256(kind || owner || timestamp_nanos || nonce)[..16])
pub fn generate_id(kind: &str, owner: &str, at: DateTime<Utc>) -> String {
    let nonce = ID_NONCE.fetch_add(1, Ordering::Relaxed);
    let id_data = format!(
        "{}:{}:{}:{}",
        kind,
        owner,
        at.timestamp_nanos_opt().unwrap_or(0),
        nonce
    );
    hex::encode(&sha256(id_data.as_bytes())[..16])
}
