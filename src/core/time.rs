//! Timestamps, identifiers and the CLI response envelope.

use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Prefix carried by every generated collection id.
pub const COLLECTION_ID_PREFIX: &str = "pbc_";

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// `pbc_` followed by a lowercase ULID.
pub fn new_collection_id() -> String {
    format!(
        "{}{}",
        COLLECTION_ID_PREFIX,
        Ulid::new().to_string().to_lowercase()
    )
}

/// Response envelope for `--format json` output.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}
