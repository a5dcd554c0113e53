//! Domain models for the landing page analysis pipeline.
//!
//! - [`RawRow`] - one header-keyed row as produced by the parser
//! - [`PageCandidate`] - a validated, typed row before metrics
//! - [`LandingPageRecord`] - a qualifying row with its conversion rate
//! - [`ChannelResult`] - best and worst landing pages of one channel

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Raw Rows
// =============================================================================

/// A row keyed by header name, in header order.
pub type RawRow = Map<String, Value>;

// =============================================================================
// Typed Rows
// =============================================================================

/// A row that passed presence and numeric checks.
///
/// Counts are signed because base-10 parsing accepts a leading `-`;
/// negative values are rejected later by the business rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCandidate {
    /// Index of the source row in the parsed table.
    #[serde(skip)]
    pub row: usize,
    pub landing_page: String,
    pub channel_grouping: String,
    pub sessions: i64,
    pub transactions: i64,
}

/// A qualifying landing page with its conversion rate.
///
/// Built once by [`crate::transform::metrics::enrich`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingPageRecord {
    #[serde(skip)]
    row: usize,
    landing_page: String,
    channel_grouping: String,
    sessions: i64,
    transactions: i64,
    conversion_rate: f64,
}

impl LandingPageRecord {
    pub(crate) fn new(candidate: PageCandidate, conversion_rate: f64) -> Self {
        Self {
            row: candidate.row,
            landing_page: candidate.landing_page,
            channel_grouping: candidate.channel_grouping,
            sessions: candidate.sessions,
            transactions: candidate.transactions,
            conversion_rate,
        }
    }

    /// Index of the source row in the parsed table.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn landing_page(&self) -> &str {
        &self.landing_page
    }

    pub fn channel_grouping(&self) -> &str {
        &self.channel_grouping
    }

    pub fn sessions(&self) -> i64 {
        self.sessions
    }

    pub fn transactions(&self) -> i64 {
        self.transactions
    }

    /// Percentage, rounded to two decimals.
    pub fn conversion_rate(&self) -> f64 {
        self.conversion_rate
    }
}

// =============================================================================
// Channel Results
// =============================================================================

/// Best and worst landing pages for one channel.
///
/// Both slices are ordered by sessions, highest first. `bottom5` never
/// shares a record with `top5` and stays empty for channels with five
/// or fewer qualifying pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub channel_name: String,
    pub top5: Vec<LandingPageRecord>,
    pub bottom5: Vec<LandingPageRecord>,
}

impl ChannelResult {
    /// Number of landing pages shown for this channel.
    pub fn len(&self) -> usize {
        self.top5.len() + self.bottom5.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top5.is_empty() && self.bottom5.is_empty()
    }
}
