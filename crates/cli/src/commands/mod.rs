//! Entity commands shared by both collections
//!
//! Each command drives the synchronization service the way an interactive
//! client would: it subscribes to the channels, triggers one operation and
//! reads what was published.

pub mod buecher;
pub mod charts;
pub mod kunden;

use anyhow::{anyhow, bail, Result};
use bookshop_lib::{describe_search_error, Entity, SyncService};
use serde_json::Value;
use tabled::Tabled;

use crate::output::{
    print_error, print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for single-entity detail tables
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Search and return the published list; a failure becomes the search error message
pub async fn search<E: Entity>(service: &SyncService<E>, criteria: &E::Criteria) -> Result<Vec<E>> {
    let mut lists = service.list_stream();
    let mut errors = service.error_stream();

    service.find(criteria).await;

    if let Some(list) = lists.try_next() {
        return Ok(list);
    }
    let error = errors.try_next();
    bail!(describe_search_error(error.as_ref(), E::NOT_FOUND_MESSAGE))
}

/// Fetch one entity together with its version
pub async fn fetch_one<E: Entity>(service: &SyncService<E>, id: &str) -> Result<E> {
    let mut entities = service.entity_stream();
    let mut errors = service.error_stream();

    service.find_by_id(Some(id)).await;

    if let Some(entity) = entities.try_next() {
        return Ok(entity);
    }
    match errors.try_next() {
        Some(error) => bail!(describe_search_error(Some(&error), E::NOT_FOUND_MESSAGE)),
        None => bail!(
            "No usable response for {}/{} (missing body or ETag)",
            E::COLLECTION,
            id
        ),
    }
}

pub async fn create<E: Entity>(service: &SyncService<E>, entity: &E) -> Result<()> {
    let mut location = None;
    let mut failure = None;

    service
        .save(
            entity,
            |loc| location = Some(loc),
            |status, body| failure = Some((status, body)),
        )
        .await;

    match (location, failure) {
        (Some(location), _) => {
            let location = location.unwrap_or_else(|| "no Location header".to_string());
            print_success(&format!("Created {}", location));
            Ok(())
        }
        (None, Some((status, body))) => Err(rejected("Create", status, body)),
        (None, None) => bail!("Create failed: no response from server"),
    }
}

/// Fetch the current version, apply `changes` and send the update
pub async fn update<E, F>(service: &SyncService<E>, id: &str, changes: F) -> Result<()>
where
    E: Entity,
    F: FnOnce(&mut E),
{
    let mut entity = fetch_one(service, id).await?;
    changes(&mut entity);

    let mut updated = false;
    let mut failure = None;

    service
        .update(
            &entity,
            || updated = true,
            |status, body| failure = Some((status, body)),
        )
        .await;

    if updated {
        print_success(&format!("Updated {}/{}", E::COLLECTION, id));
        return Ok(());
    }
    match failure {
        Some((status, body)) => Err(rejected("Update", status, body)),
        None => bail!("Update failed: no response from server"),
    }
}

pub async fn delete<E: Entity + Default>(service: &SyncService<E>, id: &str) -> Result<()> {
    let mut entity = E::default();
    entity.assign_identity(id.to_string(), None);

    let mut deleted = false;
    let mut status = None;

    service
        .remove(&entity, || deleted = true, |s| status = Some(s))
        .await;

    if deleted {
        print_success(&format!("Deleted {}/{}", E::COLLECTION, id));
        return Ok(());
    }
    match status {
        Some(status) => Err(rejected("Delete", status, None)),
        None => bail!("Delete failed: no response from server"),
    }
}

/// Print the server's error payload and turn the status into an error
fn rejected(action: &str, status: u16, body: Option<Value>) -> anyhow::Error {
    if let Some(body) = body {
        let rendered = match body {
            Value::String(text) => text,
            other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
        };
        print_error(&rendered);
    }
    if status == 409 || status == 412 {
        return anyhow!(
            "{} rejected with status {}: the entity was changed in the meantime, fetch it again",
            action,
            status
        );
    }
    anyhow!("{} rejected with status {}", action, status)
}

/// Entity as JSON including its client-side identity and version
pub fn entity_json<E: Entity>(entity: &E) -> Result<Value> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(map) = &mut value {
        map.insert("id".into(), entity.id().map(Value::from).unwrap_or(Value::Null));
        map.insert(
            "version".into(),
            entity.version().map(Value::from).unwrap_or(Value::Null),
        );
    }
    Ok(value)
}

pub fn print_list<E, R, F>(entities: &[E], format: OutputFormat, to_row: F) -> Result<()>
where
    E: Entity,
    R: Tabled,
    F: Fn(&E) -> R,
{
    match format {
        OutputFormat::Json => {
            let values = entities.iter().map(entity_json).collect::<Result<Vec<_>>>()?;
            print_json(&values)
        }
        OutputFormat::Table => {
            if entities.is_empty() {
                print_warning(E::NOT_FOUND_MESSAGE);
                return Ok(());
            }
            print_table(entities.iter().map(to_row).collect());
            println!("\nTotal: {}", entities.len());
            Ok(())
        }
    }
}

pub fn print_details<E: Entity>(
    entity: &E,
    format: OutputFormat,
    fields: Vec<(&'static str, String)>,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&entity_json(entity)?),
        OutputFormat::Table => {
            let mut rows = vec![
                FieldRow {
                    field: "ID",
                    value: entity.id().unwrap_or("-").to_string(),
                },
                FieldRow {
                    field: "Version",
                    value: entity.version().unwrap_or("-").to_string(),
                },
            ];
            rows.extend(
                fields
                    .into_iter()
                    .map(|(field, value)| FieldRow { field, value }),
            );
            print_table(rows);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshop_lib::Buch;

    #[test]
    fn test_entity_json_includes_identity() {
        let mut buch = Buch::new("Alpha");
        buch.assign_identity("1".into(), Some("\"0\"".into()));

        let value = entity_json(&buch).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["version"], "\"0\"");
        assert_eq!(value["titel"], "Alpha");
    }

    #[test]
    fn test_entity_json_without_identity() {
        let value = entity_json(&Buch::new("Neu")).unwrap();
        assert!(value["id"].is_null());
        assert!(value["version"].is_null());
    }
}
