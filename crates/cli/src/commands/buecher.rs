//! Book commands

use anyhow::Result;
use bookshop_lib::models::BuchStammdaten;
use bookshop_lib::{Buch, BuchArt, BuchCriteria, BuchService, Entity, Verlag};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use tabled::Tabled;

use super::charts::{self, ChartArg};
use super::{create, delete, fetch_one, print_details, print_list, search, update};
use crate::output::{color_flag, format_discount, format_price, format_rating, or_dash, OutputFormat};

#[derive(Subcommand)]
pub enum BuchCommands {
    /// Search books; without criteria every book is listed
    Search {
        /// Title (substring)
        #[arg(long)]
        titel: Option<String>,

        /// Publisher (FOO_VERLAG, BAR_VERLAG)
        #[arg(long)]
        verlag: Option<Verlag>,

        /// Edition (KINDLE, DRUCKAUSGABE)
        #[arg(long)]
        art: Option<BuchArt>,

        /// Only books tagged JAVASCRIPT
        #[arg(long)]
        javascript: bool,

        /// Only books tagged TYPESCRIPT
        #[arg(long)]
        typescript: bool,
    },

    /// Show a book with its current version
    Show {
        /// Book ID
        id: String,
    },

    /// Create a book
    Create {
        /// Title
        #[arg(long)]
        titel: String,

        #[command(flatten)]
        fields: BuchFields,
    },

    /// Update a book; the current version is fetched first
    Update {
        /// Book ID
        id: String,

        /// New title
        #[arg(long)]
        titel: Option<String>,

        #[command(flatten)]
        fields: BuchFields,
    },

    /// Delete a book
    Delete {
        /// Book ID
        id: String,
    },

    /// Chart of the ratings of all books
    Chart {
        #[arg(value_enum)]
        kind: ChartArg,
    },
}

/// Master data options shared by create and update
#[derive(Args, Debug, Default)]
pub struct BuchFields {
    /// Rating from 0 to 5
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    rating: Option<u8>,

    /// Edition (KINDLE, DRUCKAUSGABE)
    #[arg(long)]
    art: Option<BuchArt>,

    /// Publisher (FOO_VERLAG, BAR_VERLAG)
    #[arg(long)]
    verlag: Option<Verlag>,

    /// Publication date (YYYY-MM-DD)
    #[arg(long)]
    datum: Option<NaiveDate>,

    /// Price in euros
    #[arg(long)]
    preis: Option<f64>,

    /// Discount ratio, e.g. 0.1 for 10%
    #[arg(long)]
    rabatt: Option<f64>,

    /// Deliverable (true/false)
    #[arg(long)]
    lieferbar: Option<bool>,

    #[arg(long)]
    isbn: Option<String>,

    #[arg(long)]
    homepage: Option<String>,

    /// Tag with JAVASCRIPT (replaces the keywords)
    #[arg(long)]
    javascript: bool,

    /// Tag with TYPESCRIPT (replaces the keywords)
    #[arg(long)]
    typescript: bool,
}

impl BuchFields {
    fn apply(self, buch: &mut Buch, titel: Option<String>) {
        let retag = self.javascript || self.typescript;
        buch.update_stammdaten(BuchStammdaten {
            titel,
            rating: self.rating.map(f64::from),
            art: self.art,
            verlag: self.verlag,
            datum: self.datum,
            preis: self.preis,
            rabatt: self.rabatt,
            lieferbar: self.lieferbar,
            isbn: self.isbn,
            homepage: self.homepage,
        });
        if retag {
            buch.update_schlagwoerter(self.javascript, self.typescript);
        }
    }
}

/// Row for the books table
#[derive(Tabled)]
struct BuchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Titel")]
    titel: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Art")]
    art: String,
    #[tabled(rename = "Verlag")]
    verlag: String,
    #[tabled(rename = "Preis")]
    preis: String,
    #[tabled(rename = "Lieferbar")]
    lieferbar: String,
    #[tabled(rename = "Schlagwörter")]
    schlagwoerter: String,
}

impl From<&Buch> for BuchRow {
    fn from(buch: &Buch) -> Self {
        Self {
            id: or_dash(buch.id()),
            titel: or_dash(buch.titel.as_deref()),
            rating: format_rating(buch.rating),
            art: or_dash(buch.art.map(|a| a.as_str())),
            verlag: or_dash(buch.verlag.map(|v| v.as_str())),
            preis: format_price(buch.preis),
            lieferbar: color_flag(buch.lieferbar),
            schlagwoerter: buch.schlagwoerter.join(", "),
        }
    }
}

fn details(buch: &Buch) -> Vec<(&'static str, String)> {
    vec![
        ("Titel", or_dash(buch.titel.as_deref())),
        ("Rating", format_rating(buch.rating)),
        ("Art", or_dash(buch.art.map(|a| a.as_str()))),
        ("Verlag", or_dash(buch.verlag.map(|v| v.as_str()))),
        ("Datum", or_dash(buch.datum)),
        ("Preis", format_price(buch.preis)),
        ("Rabatt", format_discount(buch.rabatt)),
        ("Lieferbar", color_flag(buch.lieferbar)),
        ("Schlagwörter", buch.schlagwoerter.join(", ")),
        ("ISBN", or_dash(buch.isbn.as_deref())),
        ("Homepage", or_dash(buch.homepage.as_deref())),
    ]
}

pub async fn run(service: &BuchService, command: BuchCommands, format: OutputFormat) -> Result<()> {
    match command {
        BuchCommands::Search {
            titel,
            verlag,
            art,
            javascript,
            typescript,
        } => {
            let criteria = BuchCriteria {
                titel,
                verlag,
                art,
                javascript,
                typescript,
            };
            let buecher = search(service, &criteria).await?;
            print_list(&buecher, format, |buch| BuchRow::from(buch))
        }
        BuchCommands::Show { id } => {
            let buch = fetch_one(service, &id).await?;
            print_details(&buch, format, details(&buch))
        }
        BuchCommands::Create { titel, fields } => {
            let mut buch = Buch::new(titel);
            fields.apply(&mut buch, None);
            create(service, &buch).await
        }
        BuchCommands::Update { id, titel, fields } => {
            update(service, &id, |buch: &mut Buch| fields.apply(buch, titel)).await
        }
        BuchCommands::Delete { id } => delete(service, &id).await,
        BuchCommands::Chart { kind } => charts::draw(service, kind, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_merge_and_retag() {
        let mut buch = Buch::new("Alpha");
        buch.schlagwoerter = vec!["JAVASCRIPT".into()];
        buch.rating = Some(2.0);

        let fields = BuchFields {
            preis: Some(11.1),
            typescript: true,
            ..Default::default()
        };
        fields.apply(&mut buch, Some("Beta".into()));

        assert_eq!(buch.titel.as_deref(), Some("Beta"));
        assert_eq!(buch.rating, Some(2.0));
        assert_eq!(buch.preis, Some(11.1));
        assert_eq!(buch.schlagwoerter, vec!["TYPESCRIPT"]);
    }

    #[test]
    fn test_fields_without_flags_keep_keywords() {
        let mut buch = Buch::new("Alpha");
        buch.schlagwoerter = vec!["JAVASCRIPT".into()];

        BuchFields::default().apply(&mut buch, None);

        assert_eq!(buch.titel.as_deref(), Some("Alpha"));
        assert_eq!(buch.schlagwoerter, vec!["JAVASCRIPT"]);
    }

    #[test]
    fn test_row_shows_identity() {
        let mut buch = Buch::new("Alpha");
        buch.assign_identity("7".into(), None);
        let row = BuchRow::from(&buch);
        assert_eq!(row.id, "7");
        assert_eq!(row.titel, "Alpha");
        assert_eq!(row.preis, "-");
    }
}
