//! Book ("Buch") entity and its search criteria

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{parse_wire_name, Entity};
use crate::criteria::{QueryParams, SearchCriteria};

pub const JAVASCRIPT: &str = "JAVASCRIPT";
pub const TYPESCRIPT: &str = "TYPESCRIPT";

/// Publisher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verlag {
    FooVerlag,
    BarVerlag,
}

impl Verlag {
    const VARIANTS: &'static [(Verlag, &'static str)] = &[
        (Verlag::FooVerlag, "FOO_VERLAG"),
        (Verlag::BarVerlag, "BAR_VERLAG"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verlag::FooVerlag => "FOO_VERLAG",
            Verlag::BarVerlag => "BAR_VERLAG",
        }
    }
}

impl FromStr for Verlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name(s, Self::VARIANTS, "verlag")
    }
}

/// Edition type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuchArt {
    Kindle,
    Druckausgabe,
}

impl BuchArt {
    const VARIANTS: &'static [(BuchArt, &'static str)] = &[
        (BuchArt::Kindle, "KINDLE"),
        (BuchArt::Druckausgabe, "DRUCKAUSGABE"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuchArt::Kindle => "KINDLE",
            BuchArt::Druckausgabe => "DRUCKAUSGABE",
        }
    }
}

impl FromStr for BuchArt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name(s, Self::VARIANTS, "art")
    }
}

/// A book as seen by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buch {
    #[serde(skip)]
    id: Option<String>,
    #[serde(skip)]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art: Option<BuchArt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verlag: Option<Verlag>,
    #[serde(
        default,
        deserialize_with = "super::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub datum: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preis: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rabatt: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub lieferbar: bool,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub schlagwoerter: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Master data changes; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct BuchStammdaten {
    pub titel: Option<String>,
    pub rating: Option<f64>,
    pub art: Option<BuchArt>,
    pub verlag: Option<Verlag>,
    pub datum: Option<NaiveDate>,
    pub preis: Option<f64>,
    pub rabatt: Option<f64>,
    pub lieferbar: Option<bool>,
    pub isbn: Option<String>,
    pub homepage: Option<String>,
}

impl Buch {
    /// A new book that has not been saved yet (no identity, no version)
    pub fn new(titel: impl Into<String>) -> Self {
        Self {
            titel: Some(titel.into()),
            ..Self::default()
        }
    }

    pub fn has_schlagwort(&self, schlagwort: &str) -> bool {
        self.schlagwoerter
            .iter()
            .any(|s| s.eq_ignore_ascii_case(schlagwort))
    }

    /// Replace the keywords with the checked ones
    pub fn update_schlagwoerter(&mut self, javascript: bool, typescript: bool) {
        self.schlagwoerter.clear();
        if javascript {
            self.schlagwoerter.push(JAVASCRIPT.to_string());
        }
        if typescript {
            self.schlagwoerter.push(TYPESCRIPT.to_string());
        }
    }

    pub fn update_stammdaten(&mut self, changes: BuchStammdaten) {
        if let Some(titel) = changes.titel {
            self.titel = Some(titel);
        }
        if let Some(rating) = changes.rating {
            self.rating = Some(rating);
        }
        if let Some(art) = changes.art {
            self.art = Some(art);
        }
        if let Some(verlag) = changes.verlag {
            self.verlag = Some(verlag);
        }
        if let Some(datum) = changes.datum {
            self.datum = Some(datum);
        }
        if let Some(preis) = changes.preis {
            self.preis = Some(preis);
        }
        if let Some(rabatt) = changes.rabatt {
            self.rabatt = Some(rabatt);
        }
        if let Some(lieferbar) = changes.lieferbar {
            self.lieferbar = lieferbar;
        }
        if let Some(isbn) = changes.isbn {
            self.isbn = Some(isbn);
        }
        if let Some(homepage) = changes.homepage {
            self.homepage = Some(homepage);
        }
    }
}

impl Entity for Buch {
    type Criteria = BuchCriteria;

    const COLLECTION: &'static str = "buecher";
    const NOT_FOUND_MESSAGE: &'static str = "Keine Bücher gefunden.";
    const CHART_DATASET_LABEL: &'static str = "Bewertungen";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn assign_identity(&mut self, id: String, version: Option<String>) {
        self.id = Some(id);
        self.version = version;
    }

    fn chart_label(&self) -> Option<&str> {
        self.titel.as_deref()
    }

    fn chart_value(&self) -> Option<f64> {
        self.rating
    }
}

impl fmt::Display for Buch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Buch {{id: {}, version: {}, titel: {}}}",
            self.id.as_deref().unwrap_or("-"),
            self.version.as_deref().unwrap_or("-"),
            self.titel.as_deref().unwrap_or("-")
        )
    }
}

/// Search criteria for books
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuchCriteria {
    pub titel: Option<String>,
    pub verlag: Option<Verlag>,
    pub art: Option<BuchArt>,
    pub javascript: bool,
    pub typescript: bool,
}

impl BuchCriteria {
    /// Build criteria from raw form values, where an empty string means "no filter"
    pub fn from_form(titel: &str, verlag: &str, art: &str) -> Result<Self, String> {
        let verlag = match verlag.trim() {
            "" => None,
            v => Some(v.parse()?),
        };
        let art = match art.trim() {
            "" => None,
            a => Some(a.parse()?),
        };
        Ok(Self {
            titel: Some(titel.to_string()),
            verlag,
            art,
            ..Self::default()
        })
    }
}

impl SearchCriteria for BuchCriteria {
    fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_if_present("titel", self.titel.as_deref());
        params.push_if_present("verlag", self.verlag.map(|v| v.as_str()));
        params.push_if_present("art", self.art.map(|a| a.as_str()));
        params.push_flag("javascript", self.javascript);
        params.push_flag("typescript", self.typescript);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_scenario_encodes_only_titel() {
        let criteria = BuchCriteria::from_form("Java", "", "").unwrap();
        let params = criteria.to_query();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("titel"), Some("Java"));
    }

    #[test]
    fn test_empty_criteria_encode_nothing() {
        assert!(BuchCriteria::default().to_query().is_empty());
        assert!(BuchCriteria::from_form("", "", "").unwrap().to_query().is_empty());
    }

    #[test]
    fn test_enum_and_flag_criteria() {
        let criteria = BuchCriteria {
            verlag: Some(Verlag::BarVerlag),
            art: Some(BuchArt::Kindle),
            typescript: true,
            ..Default::default()
        };
        let params = criteria.to_query();
        assert_eq!(params.get("verlag"), Some("BAR_VERLAG"));
        assert_eq!(params.get("art"), Some("KINDLE"));
        assert_eq!(params.get("typescript"), Some("true"));
        assert_eq!(params.get("javascript"), None);
    }

    #[test]
    fn test_form_rejects_unknown_verlag() {
        assert!(BuchCriteria::from_form("", "BAZ", "").is_err());
        assert_eq!("foo_verlag".parse::<Verlag>(), Ok(Verlag::FooVerlag));
    }

    #[test]
    fn test_new_buch_has_no_identity() {
        let buch = Buch::new("Alpha");
        assert!(buch.id().is_none());
        assert!(buch.version().is_none());
    }

    #[test]
    fn test_identity_not_serialized() {
        let mut buch = Buch::new("Alpha");
        buch.assign_identity("1".into(), Some("\"0\"".into()));
        let value = serde_json::to_value(&buch).unwrap();
        assert_eq!(value, json!({"titel": "Alpha", "lieferbar": false, "schlagwoerter": []}));
    }

    #[test]
    fn test_schlagwoerter() {
        let mut buch = Buch::new("Alpha");
        buch.update_schlagwoerter(true, false);
        assert!(buch.has_schlagwort(JAVASCRIPT));
        assert!(!buch.has_schlagwort(TYPESCRIPT));

        buch.update_schlagwoerter(false, true);
        assert_eq!(buch.schlagwoerter, vec![TYPESCRIPT.to_string()]);
    }

    #[test]
    fn test_update_stammdaten_keeps_unset_fields() {
        let mut buch = Buch::new("Alpha");
        buch.rating = Some(3.0);
        buch.update_stammdaten(BuchStammdaten {
            titel: Some("Beta".into()),
            preis: Some(12.5),
            ..Default::default()
        });
        assert_eq!(buch.titel.as_deref(), Some("Beta"));
        assert_eq!(buch.rating, Some(3.0));
        assert_eq!(buch.preis, Some(12.5));
    }

    #[test]
    fn test_deserialize_server_record() {
        let raw = json!({
            "titel": "Alpha",
            "rating": 4,
            "art": "DRUCKAUSGABE",
            "verlag": "FOO_VERLAG",
            "datum": "2019-02-01",
            "preis": 11.1,
            "rabatt": 0.011,
            "lieferbar": true,
            "schlagwoerter": ["JAVASCRIPT"],
            "isbn": "978-3-897-22583-1",
            "_links": {"self": {"href": "https://localhost/rest/buecher/1"}}
        });
        let buch: Buch = serde_json::from_value(raw).unwrap();
        assert_eq!(buch.art, Some(BuchArt::Druckausgabe));
        assert_eq!(buch.datum, NaiveDate::from_ymd_opt(2019, 2, 1));
        assert_eq!(buch.chart_value(), Some(4.0));
    }

    #[test]
    fn test_deserialize_tolerates_nulls_and_timestamps() {
        let raw = json!({
            "titel": "Beta",
            "rating": 4.5,
            "datum": "2020-01-01T00:00:00Z",
            "lieferbar": null,
            "schlagwoerter": null
        });
        let buch: Buch = serde_json::from_value(raw).unwrap();
        assert_eq!(buch.rating, Some(4.5));
        assert_eq!(buch.datum, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert!(!buch.lieferbar);
        assert!(buch.schlagwoerter.is_empty());

        let unrated: Buch = serde_json::from_value(json!({"datum": null})).unwrap();
        assert_eq!(unrated.datum, None);
        assert_eq!(unrated.chart_value(), None);
    }
}
