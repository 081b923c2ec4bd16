//! Mapping of raw server records into typed entities
//!
//! Server records carry their identity either directly (`id` / `_id`) or
//! only through the hypermedia self-link (`_links.self.href`). When neither
//! yields an identity the entity gets the literal `"undefined"`, so that
//! identity is always a non-empty string downstream.

use serde_json::Value;

use crate::models::Entity;

/// Identity given to records from which no identity can be derived
pub const UNDEFINED_ID: &str = "undefined";

/// Derive the identity of a raw record
pub fn derive_id(raw: &Value) -> String {
    direct_id(raw)
        .or_else(|| self_link_id(raw))
        .unwrap_or_else(|| UNDEFINED_ID.to_string())
}

fn direct_id(raw: &Value) -> Option<String> {
    ["id", "_id"].iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Last path segment of `_links.self.href`
fn self_link_id(raw: &Value) -> Option<String> {
    let href = raw.pointer("/_links/self/href")?.as_str()?;
    let href = href.split(['?', '#']).next().unwrap_or(href);
    let segment = match href.rfind('/') {
        Some(pos) => &href[pos + 1..],
        None => href,
    };
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Map a raw server record plus an optional version token into an entity
pub fn map_record<E: Entity>(raw: Value, version: Option<String>) -> Result<E, serde_json::Error> {
    let id = derive_id(&raw);
    let mut entity: E = serde_json::from_value(raw)?;
    entity.assign_identity(id, version);
    Ok(entity)
}

/// Map every element of a JSON array response, preserving order
pub fn map_records<E: Entity>(raw: Value) -> Result<Vec<E>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_value(raw)?;
    records
        .into_iter()
        .map(|record| map_record(record, None))
        .collect()
}
