//! Customer ("Kunde") entity and its search criteria

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{parse_wire_name, Entity};
use crate::criteria::{QueryParams, SearchCriteria};

/// Gender as transmitted by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Geschlecht {
    M,
    W,
    D,
}

impl Geschlecht {
    const VARIANTS: &'static [(Geschlecht, &'static str)] = &[
        (Geschlecht::M, "M"),
        (Geschlecht::W, "W"),
        (Geschlecht::D, "D"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Geschlecht::M => "M",
            Geschlecht::W => "W",
            Geschlecht::D => "D",
        }
    }
}

impl FromStr for Geschlecht {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name(s, Self::VARIANTS, "geschlecht")
    }
}

/// A customer as seen by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kunde {
    #[serde(skip)]
    id: Option<String>,
    #[serde(skip)]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nachname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kategorie: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub newsletter: bool,
    #[serde(
        default,
        deserialize_with = "super::lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub geburtsdatum: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geschlecht: Option<Geschlecht>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub interessen: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Master data changes; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct KundeStammdaten {
    pub nachname: Option<String>,
    pub email: Option<String>,
    pub kategorie: Option<f64>,
    pub newsletter: Option<bool>,
    pub geburtsdatum: Option<NaiveDate>,
    pub geschlecht: Option<Geschlecht>,
    pub homepage: Option<String>,
}

impl Kunde {
    /// A new customer that has not been saved yet
    pub fn new(nachname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            nachname: Some(nachname.into()),
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn update_stammdaten(&mut self, changes: KundeStammdaten) {
        if let Some(nachname) = changes.nachname {
            self.nachname = Some(nachname);
        }
        if let Some(email) = changes.email {
            self.email = Some(email);
        }
        if let Some(kategorie) = changes.kategorie {
            self.kategorie = Some(kategorie);
        }
        if let Some(newsletter) = changes.newsletter {
            self.newsletter = newsletter;
        }
        if let Some(geburtsdatum) = changes.geburtsdatum {
            self.geburtsdatum = Some(geburtsdatum);
        }
        if let Some(geschlecht) = changes.geschlecht {
            self.geschlecht = Some(geschlecht);
        }
        if let Some(homepage) = changes.homepage {
            self.homepage = Some(homepage);
        }
    }
}

impl Entity for Kunde {
    type Criteria = KundeCriteria;

    const COLLECTION: &'static str = "kunden";
    const NOT_FOUND_MESSAGE: &'static str = "Keine Kunden gefunden.";
    const CHART_DATASET_LABEL: &'static str = "Kategorie";

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
        self.nachname.as_deref()
    }

    fn chart_value(&self) -> Option<f64> {
        self.kategorie
    }
}

impl fmt::Display for Kunde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Kunde {{id: {}, version: {}, nachname: {}}}",
            self.id.as_deref().unwrap_or("-"),
            self.version.as_deref().unwrap_or("-"),
            self.nachname.as_deref().unwrap_or("-")
        )
    }
}

/// Search criteria for customers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KundeCriteria {
    pub nachname: Option<String>,
    pub email: Option<String>,
    pub geschlecht: Option<Geschlecht>,
}

impl SearchCriteria for KundeCriteria {
    fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_if_present("nachname", self.nachname.as_deref());
        params.push_if_present("email", self.email.as_deref());
        params.push_if_present("geschlecht", self.geschlecht.map(|g| g.as_str()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_criteria_encoding() {
        let criteria = KundeCriteria {
            nachname: Some("Alpha".into()),
            email: Some(String::new()),
            geschlecht: Some(Geschlecht::W),
        };
        let params = criteria.to_query();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("nachname"), Some("Alpha"));
        assert_eq!(params.get("geschlecht"), Some("W"));
        assert!(KundeCriteria::default().to_query().is_empty());
    }

    #[test]
    fn test_chart_projection() {
        let kunde: Kunde = serde_json::from_value(json!({
            "nachname": "Beta",
            "kategorie": 3,
            "newsletter": true
        }))
        .unwrap();
        assert_eq!(kunde.chart_label(), Some("Beta"));
        assert_eq!(kunde.chart_value(), Some(3.0));
        assert!(kunde.newsletter);
    }

    #[test]
    fn test_update_stammdaten() {
        let mut kunde = Kunde::new("Alpha", "alpha@acme.de");
        kunde.update_stammdaten(KundeStammdaten {
            kategorie: Some(2.0),
            newsletter: Some(true),
            ..Default::default()
        });
        assert_eq!(kunde.email.as_deref(), Some("alpha@acme.de"));
        assert_eq!(kunde.kategorie, Some(2.0));
        assert!(kunde.newsletter);
    }

    #[test]
    fn test_deserialize_tolerates_nulls() {
        let kunde: Kunde = serde_json::from_value(json!({
            "nachname": "Gamma",
            "kategorie": 2.5,
            "newsletter": null,
            "interessen": null,
            "geburtsdatum": "1990-05-17T00:00:00+01:00"
        }))
        .unwrap();
        assert_eq!(kunde.chart_value(), Some(2.5));
        assert!(!kunde.newsletter);
        assert!(kunde.interessen.is_empty());
        assert_eq!(kunde.geburtsdatum, NaiveDate::from_ymd_opt(1990, 5, 17));
    }

    #[test]
    fn test_geschlecht_parse() {
        assert_eq!("w".parse::<Geschlecht>(), Ok(Geschlecht::W));
        assert!("X".parse::<Geschlecht>().is_err());
    }
}
