//! Presence extraction from the chat "pull" endpoint.
//!
//! The endpoint is undocumented and answers with JSON behind a
//! `for (;;);` guard. Presence arrives in two message shapes:
//! `chatproxy-presence` with `buddyList.<id>.lat` and
//! `buddylist_overlay` with `overlay.<id>.la`, both unix seconds.

use crate::error::{MissingCause, ScrapeError, ScrapeResult};
use serde_json::Value;

const JSON_GUARD: &str = "for (;;);";

/// Parse a pull response into `(entity id, last active unix time)` pairs.
///
/// A response without messages (heartbeat) yields no observations.
pub fn parse_presence(body: &str) -> ScrapeResult<Vec<(String, i64)>> {
    let payload = body.trim_start();
    let payload = payload.strip_prefix(JSON_GUARD).unwrap_or(payload);

    let value: Value = serde_json::from_str(payload.trim()).map_err(|e| {
        tracing::error!("failed to parse presence payload: {e}");
        ScrapeError::StructureNotFound {
            page: "presence",
            cause: MissingCause::LayoutChanged,
        }
    })?;

    let mut observed = Vec::new();
    let Some(messages) = value.get("ms").and_then(Value::as_array) else {
        let kind = value.get("t").and_then(Value::as_str).unwrap_or("?");
        tracing::debug!("presence response without messages: t={kind}");
        return Ok(observed);
    };

    for message in messages {
        if let Some(buddies) = message.get("buddyList").and_then(Value::as_object) {
            collect(buddies, "lat", &mut observed);
        }
        if let Some(overlay) = message.get("overlay").and_then(Value::as_object) {
            collect(overlay, "la", &mut observed);
        }
    }
    Ok(observed)
}

fn collect(entries: &serde_json::Map<String, Value>, field: &str, out: &mut Vec<(String, i64)>) {
    for (id, entry) in entries {
        // Timestamps occasionally arrive as strings.
        let ts = entry.get(field).and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        });
        if let Some(ts) = ts.filter(|ts| *ts > 0) {
            out.push((id.clone(), ts));
        }
    }
}
