//! Entity types managed by the synchronization service

mod buch;
mod kunde;

pub use buch::{Buch, BuchArt, BuchCriteria, BuchStammdaten, Verlag, JAVASCRIPT, TYPESCRIPT};
pub use kunde::{Geschlecht, Kunde, KundeCriteria, KundeStammdaten};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Debug;

use crate::criteria::SearchCriteria;

/// A record type served by one REST collection.
///
/// Identity and version are client-side metadata: they are derived from the
/// self-link and the `ETag` header and never serialized into request bodies.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Search criteria accepted by the collection endpoint
    type Criteria: SearchCriteria + Send + Sync;

    /// Collection path segment below the base URI
    const COLLECTION: &'static str;

    /// Text rendered when a search finds nothing (HTTP 404)
    const NOT_FOUND_MESSAGE: &'static str;

    /// Dataset label used for bar and line charts
    const CHART_DATASET_LABEL: &'static str;

    fn id(&self) -> Option<&str>;

    fn version(&self) -> Option<&str>;

    /// Attach identity and version after mapping a server record
    fn assign_identity(&mut self, id: String, version: Option<String>);

    /// Label of the chart point for this entity, if it has one
    fn chart_label(&self) -> Option<&str>;

    /// Metric of the chart point for this entity; `None` is drawn as a gap
    fn chart_value(&self) -> Option<f64>;
}

/// Treat an explicit JSON `null` like an absent field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a plain date, an RFC 3339 timestamp or a local date-time.
///
/// Anything else, including `null`, yields `None` instead of failing the record.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_date))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Parse an enum variant from its wire name, ignoring case
pub(crate) fn parse_wire_name<T: Copy>(
    value: &str,
    variants: &[(T, &'static str)],
    kind: &str,
) -> Result<T, String> {
    variants
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(value.trim()))
        .map(|(variant, _)| *variant)
        .ok_or_else(|| {
            let names: Vec<&str> = variants.iter().map(|(_, n)| *n).collect();
            format!("invalid {} '{}', expected one of: {}", kind, value, names.join(", "))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 1);
        assert_eq!(parse_date("2020-01-01"), expected);
        assert_eq!(parse_date("2020-01-01T00:00:00Z"), expected);
        assert_eq!(parse_date("2020-01-01T23:30:00+02:00"), expected);
        assert_eq!(parse_date("2020-01-01T08:15:00.250"), expected);
        assert_eq!(parse_date("01.01.2020"), None);
    }
}
