//! Downloadable CSV of every qualifying landing page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::models::LandingPageRecord;

/// Header row of the exported file.
pub const EXPORT_HEADERS: [&str; 5] = [
    "Landing Page",
    "Channel",
    "Sessions",
    "Transactions",
    "Conversion Rate (%)",
];

/// Display-ready projection of a [`LandingPageRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub landing_page: String,
    pub channel: String,
    pub sessions: i64,
    pub transactions: i64,
    /// Fixed two decimals, e.g. `"20.00"`
    pub conversion_rate: String,
}

impl From<&LandingPageRecord> for ExportRow {
    fn from(record: &LandingPageRecord) -> Self {
        Self {
            landing_page: record.landing_page().to_string(),
            channel: record.channel_grouping().to_string(),
            sessions: record.sessions(),
            transactions: record.transactions(),
            conversion_rate: format!("{:.2}", record.conversion_rate()),
        }
    }
}

/// Write rows as CSV.
///
/// Fields containing a comma, quote or newline are wrapped in double
/// quotes, with embedded quotes doubled.
pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(EXPORT_HEADERS)?;
    for row in rows {
        let sessions = row.sessions.to_string();
        let transactions = row.transactions.to_string();
        wtr.write_record([
            row.landing_page.as_str(),
            row.channel.as_str(),
            sessions.as_str(),
            transactions.as_str(),
            row.conversion_rate.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render rows as a CSV string.
pub fn to_csv(rows: &[ExportRow]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `landing-page-analysis-YYYY-MM-DD.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("landing-page-analysis-{}.csv", date.format("%Y-%m-%d"))
}
