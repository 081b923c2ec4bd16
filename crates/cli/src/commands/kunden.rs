//! Customer commands

use anyhow::Result;
use bookshop_lib::models::KundeStammdaten;
use bookshop_lib::{Entity, Geschlecht, Kunde, KundeCriteria, KundeService};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use tabled::Tabled;

use super::charts::{self, ChartArg};
use super::{create, delete, fetch_one, print_details, print_list, search, update};
use crate::output::{color_flag, or_dash, OutputFormat};

#[derive(Subcommand)]
pub enum KundeCommands {
    /// Search customers; without criteria every customer is listed
    Search {
        /// Last name
        #[arg(long)]
        nachname: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Gender (M, W, D)
        #[arg(long)]
        geschlecht: Option<Geschlecht>,
    },

    /// Show a customer with the current version
    Show {
        /// Customer ID
        id: String,
    },

    /// Create a customer
    Create {
        /// Last name
        #[arg(long)]
        nachname: String,

        #[arg(long)]
        email: String,

        #[command(flatten)]
        fields: KundeFields,
    },

    /// Update a customer; the current version is fetched first
    Update {
        /// Customer ID
        id: String,

        #[arg(long)]
        nachname: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[command(flatten)]
        fields: KundeFields,
    },

    /// Delete a customer
    Delete {
        /// Customer ID
        id: String,
    },

    /// Chart of the categories of all customers
    Chart {
        #[arg(value_enum)]
        kind: ChartArg,
    },
}

#[derive(Args, Debug, Default)]
pub struct KundeFields {
    /// Category from 0 to 9
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    kategorie: Option<u8>,

    /// Newsletter subscription (true/false)
    #[arg(long)]
    newsletter: Option<bool>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    geburtsdatum: Option<NaiveDate>,

    /// Gender (M, W, D)
    #[arg(long)]
    geschlecht: Option<Geschlecht>,

    #[arg(long)]
    homepage: Option<String>,
}

impl KundeFields {
    fn apply(self, kunde: &mut Kunde, nachname: Option<String>, email: Option<String>) {
        kunde.update_stammdaten(KundeStammdaten {
            nachname,
            email,
            kategorie: self.kategorie.map(f64::from),
            newsletter: self.newsletter,
            geburtsdatum: self.geburtsdatum,
            geschlecht: self.geschlecht,
            homepage: self.homepage,
        });
    }
}

/// Row for the customers table
#[derive(Tabled)]
struct KundeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Nachname")]
    nachname: String,
    #[tabled(rename = "E-Mail")]
    email: String,
    #[tabled(rename = "Kategorie")]
    kategorie: String,
    #[tabled(rename = "Geschlecht")]
    geschlecht: String,
    #[tabled(rename = "Newsletter")]
    newsletter: String,
}

impl From<&Kunde> for KundeRow {
    fn from(kunde: &Kunde) -> Self {
        Self {
            id: or_dash(kunde.id()),
            nachname: or_dash(kunde.nachname.as_deref()),
            email: or_dash(kunde.email.as_deref()),
            kategorie: or_dash(kunde.kategorie),
            geschlecht: or_dash(kunde.geschlecht.map(|g| g.as_str())),
            newsletter: color_flag(kunde.newsletter),
        }
    }
}

fn details(kunde: &Kunde) -> Vec<(&'static str, String)> {
    vec![
        ("Nachname", or_dash(kunde.nachname.as_deref())),
        ("E-Mail", or_dash(kunde.email.as_deref())),
        ("Kategorie", or_dash(kunde.kategorie)),
        ("Newsletter", color_flag(kunde.newsletter)),
        ("Geburtsdatum", or_dash(kunde.geburtsdatum)),
        ("Geschlecht", or_dash(kunde.geschlecht.map(|g| g.as_str()))),
        ("Interessen", kunde.interessen.join(", ")),
        ("Homepage", or_dash(kunde.homepage.as_deref())),
    ]
}

pub async fn run(service: &KundeService, command: KundeCommands, format: OutputFormat) -> Result<()> {
    match command {
        KundeCommands::Search {
            nachname,
            email,
            geschlecht,
        } => {
            let criteria = KundeCriteria {
                nachname,
                email,
                geschlecht,
            };
            let kunden = search(service, &criteria).await?;
            print_list(&kunden, format, |kunde| KundeRow::from(kunde))
        }
        KundeCommands::Show { id } => {
            let kunde = fetch_one(service, &id).await?;
            print_details(&kunde, format, details(&kunde))
        }
        KundeCommands::Create {
            nachname,
            email,
            fields,
        } => {
            let mut kunde = Kunde::new(nachname, email);
            fields.apply(&mut kunde, None, None);
            create(service, &kunde).await
        }
        KundeCommands::Update {
            id,
            nachname,
            email,
            fields,
        } => {
            update(service, &id, |kunde: &mut Kunde| {
                fields.apply(kunde, nachname, email)
            })
            .await
        }
        KundeCommands::Delete { id } => delete(service, &id).await,
        KundeCommands::Chart { kind } => charts::draw(service, kind, format).await,
    }
}
