//! Per-row exclusion reporting.
//!
//! Stages never fail on a bad row. They hand an [`Exclusion`] to a
//! [`DiagnosticSink`] and move on, so the transform itself stays free of I/O.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::columns::CanonicalField;

/// Why a row was left out of the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Required value empty or absent.
    MissingField(CanonicalField),
    /// Count could not be read as a base-10 integer.
    InvalidNumber(CanonicalField),
    BelowMinSessions { sessions: i64, min: i64 },
    BelowMinTransactions { transactions: i64, min: i64 },
    /// Landing page contains an excluded term such as `checkout`.
    ExcludedUrl { term: String },
    /// Landing page is exactly `/`.
    RootPage,
}

impl ExclusionReason {
    /// Stable identifier used when counting exclusions.
    pub fn kind(&self) -> &'static str {
        match self {
            ExclusionReason::MissingField(_) => "missing_field",
            ExclusionReason::InvalidNumber(_) => "invalid_number",
            ExclusionReason::BelowMinSessions { .. } => "below_min_sessions",
            ExclusionReason::BelowMinTransactions { .. } => "below_min_transactions",
            ExclusionReason::ExcludedUrl { .. } => "excluded_url",
            ExclusionReason::RootPage => "root_page",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::MissingField(field) => write!(f, "missing {}", field),
            ExclusionReason::InvalidNumber(field) => write!(f, "{} is not a number", field),
            ExclusionReason::BelowMinSessions { sessions, min } => {
                write!(f, "{} sessions (minimum {})", sessions, min)
            }
            ExclusionReason::BelowMinTransactions { transactions, min } => {
                write!(f, "{} transactions (minimum {})", transactions, min)
            }
            ExclusionReason::ExcludedUrl { term } => write!(f, "URL contains '{}'", term),
            ExclusionReason::RootPage => write!(f, "root landing page"),
        }
    }
}

/// One excluded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    /// Index of the row in the parsed table
    pub row: usize,
    pub landing_page: Option<String>,
    pub reason: ExclusionReason,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.landing_page {
            Some(page) if !page.is_empty() => {
                write!(f, "Row {} ({}): {}", self.row, page, self.reason)
            }
            _ => write!(f, "Row {}: {}", self.row, self.reason),
        }
    }
}

/// Receives exclusions as the pipeline runs.
pub trait DiagnosticSink {
    fn exclude(&mut self, exclusion: Exclusion);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn exclude(&mut self, _exclusion: Exclusion) {}
}

/// Keeps every exclusion in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ExclusionLog {
    entries: Vec<Exclusion>,
}

/// Number of rows excluded for one reason kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionCount {
    pub reason: String,
    pub count: usize,
}

impl ExclusionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Exclusion] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts per [`ExclusionReason::kind`], sorted by kind.
    pub fn counts(&self) -> Vec<ExclusionCount> {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.reason.kind()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(reason, count)| ExclusionCount {
                reason: reason.to_string(),
                count,
            })
            .collect()
    }
}

impl DiagnosticSink for ExclusionLog {
    fn exclude(&mut self, exclusion: Exclusion) {
        self.entries.push(exclusion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exclusion(row: usize, reason: ExclusionReason) -> Exclusion {
        Exclusion {
            row,
            landing_page: Some("/checkout".into()),
            reason,
        }
    }

    #[test]
    fn test_log_counts_by_kind() {
        let mut log = ExclusionLog::new();
        log.exclude(exclusion(0, ExclusionReason::RootPage));
        log.exclude(exclusion(1, ExclusionReason::ExcludedUrl { term: "checkout".into() }));
        log.exclude(exclusion(2, ExclusionReason::ExcludedUrl { term: "book".into() }));

        assert_eq!(log.len(), 3);
        assert_eq!(
            log.counts(),
            vec![
                ExclusionCount { reason: "excluded_url".into(), count: 2 },
                ExclusionCount { reason: "root_page".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_display() {
        let e = exclusion(4, ExclusionReason::BelowMinSessions { sessions: 10, min: 50 });
        assert_eq!(e.to_string(), "Row 4 (/checkout): 10 sessions (minimum 50)");

        let e = Exclusion {
            row: 2,
            landing_page: None,
            reason: ExclusionReason::MissingField(CanonicalField::ChannelGrouping),
        };
        assert_eq!(e.to_string(), "Row 2: missing channelGrouping");
    }

    #[test]
    fn test_noop_sink() {
        let mut sink = NoopSink;
        sink.exclude(exclusion(0, ExclusionReason::RootPage));
    }
}
