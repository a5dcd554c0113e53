//! Heuristic mapping of export headers to the four fields the pipeline needs.
//!
//! Analytics tools name their columns loosely (`Landing page`,
//! `Landing Page + query string`, `Sessions`, `Key events`,
//! `Transactions`, ...). Resolution walks [`COLUMN_RULES`] from narrow to
//! broad and takes the first header that matches. Unmatched fields fall
//! back to a default header name, except `sessions`, which must exist.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchemaError;
use crate::models::RawRow;

/// The fields the pipeline reads from every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    LandingPage,
    Sessions,
    ChannelGrouping,
    Transactions,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::LandingPage,
        CanonicalField::Sessions,
        CanonicalField::ChannelGrouping,
        CanonicalField::Transactions,
    ];

    /// Header name used when no rule matches.
    pub fn default_header(self) -> &'static str {
        match self {
            CanonicalField::LandingPage => "Landing page",
            CanonicalField::Sessions => "Sessions",
            CanonicalField::ChannelGrouping => "Session default channel group",
            CanonicalField::Transactions => "Key events",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CanonicalField::LandingPage => "landingPage",
            CanonicalField::Sessions => "sessions",
            CanonicalField::ChannelGrouping => "channelGrouping",
            CanonicalField::Transactions => "transactions",
        };
        f.write_str(name)
    }
}

/// One matching rule: a header matching `pattern` (and not `unless`) binds `field`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub field: CanonicalField,
    pub pattern: &'static str,
    pub unless: Option<&'static str>,
}

const fn rule(field: CanonicalField, pattern: &'static str) -> ColumnRule {
    ColumnRule { field, pattern, unless: None }
}

/// Rules in priority order. For each field the earliest matching rule wins,
/// and within a rule the earliest matching header wins.
pub const COLUMN_RULES: &[ColumnRule] = &[
    // Landing page
    rule(CanonicalField::LandingPage, r"^Landing page$"),
    rule(CanonicalField::LandingPage, r"(?i)^landing.?page$"),
    rule(CanonicalField::LandingPage, r"(?i)landing.?page"),
    rule(CanonicalField::LandingPage, r"(?i)^(url|page|page path)$"),
    // Sessions
    rule(CanonicalField::Sessions, r"^Sessions$"),
    rule(CanonicalField::Sessions, r"(?i)^sessions?$"),
    ColumnRule {
        field: CanonicalField::Sessions,
        pattern: r"(?i)session",
        unless: Some(r"(?i)channel"),
    },
    rule(CanonicalField::Sessions, r"(?i)^(visits|traffic)$"),
    // Channel
    rule(CanonicalField::ChannelGrouping, r"^Session default channel group$"),
    rule(CanonicalField::ChannelGrouping, r"(?i)channel"),
    // Key events / transactions
    rule(CanonicalField::Transactions, r"^Key events$"),
    rule(CanonicalField::Transactions, r"(?i)^(key.?events?|transactions?)$"),
    rule(CanonicalField::Transactions, r"(?i)key.?event|transaction"),
    rule(CanonicalField::Transactions, r"(?i)^(conversions|events)$"),
];

struct CompiledRule {
    field: CanonicalField,
    pattern: Regex,
    unless: Option<Regex>,
}

impl CompiledRule {
    fn matches(&self, header: &str) -> bool {
        self.pattern.is_match(header)
            && !self.unless.as_ref().is_some_and(|u| u.is_match(header))
    }
}

static COMPILED_RULES: Lazy<Vec<CompiledRule>> = Lazy::new(|| {
    COLUMN_RULES
        .iter()
        .map(|r| CompiledRule {
            field: r.field,
            pattern: Regex::new(r.pattern).expect("Invalid built-in column pattern"),
            unless: r
                .unless
                .map(|u| Regex::new(u).expect("Invalid built-in column pattern")),
        })
        .collect()
});

/// Header names bound to each canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMap {
    pub landing_page: String,
    pub sessions: String,
    pub channel_grouping: String,
    pub transactions: String,
}

impl ColumnMap {
    /// Resolve against an ordered header list.
    ///
    /// Fails only when no sessions header is present.
    pub fn resolve(headers: &[String]) -> Result<Self, SchemaError> {
        let map = Self::infer(headers);

        if !headers.iter().any(|h| *h == map.sessions) {
            return Err(SchemaError {
                expected: map.sessions,
                found: headers.to_vec(),
            });
        }

        Ok(map)
    }

    /// Bind every field without checking that the sessions header exists.
    pub fn infer(headers: &[String]) -> Self {
        ColumnMap {
            landing_page: find_header(headers, CanonicalField::LandingPage),
            sessions: find_header(headers, CanonicalField::Sessions),
            channel_grouping: find_header(headers, CanonicalField::ChannelGrouping),
            transactions: find_header(headers, CanonicalField::Transactions),
        }
    }

    /// Header bound to `field`.
    pub fn header(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::LandingPage => &self.landing_page,
            CanonicalField::Sessions => &self.sessions,
            CanonicalField::ChannelGrouping => &self.channel_grouping,
            CanonicalField::Transactions => &self.transactions,
        }
    }

    /// Fields whose header is not among `headers` (fell back to a default).
    pub fn unmatched(&self, headers: &[String]) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| !headers.iter().any(|h| h == self.header(*f)))
            .collect()
    }
}

/// Resolve from the key set of the first row.
///
/// Returns `Ok(None)` when there are no rows to inspect.
pub fn resolve_columns(rows: &[RawRow]) -> Result<Option<ColumnMap>, SchemaError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    ColumnMap::resolve(&headers).map(Some)
}

fn find_header(headers: &[String], field: CanonicalField) -> String {
    COMPILED_RULES
        .iter()
        .filter(|r| r.field == field)
        .find_map(|r| headers.iter().find(|h| r.matches(h)))
        .cloned()
        .unwrap_or_else(|| field.default_header().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ga4_default_export() {
        let map = ColumnMap::resolve(&headers(&[
            "Landing page",
            "Sessions",
            "Session default channel group",
            "Key events",
        ]))
        .unwrap();

        assert_eq!(map.landing_page, "Landing page");
        assert_eq!(map.sessions, "Sessions");
        assert_eq!(map.channel_grouping, "Session default channel group");
        assert_eq!(map.transactions, "Key events");
    }

    #[test]
    fn test_mixed_case_landing_page_resolves() {
        let map = ColumnMap::resolve(&headers(&["Landing Page", "Sessions"])).unwrap();
        assert_eq!(map.landing_page, "Landing Page");
    }

    #[test]
    fn test_broad_landing_page_pattern() {
        let map = ColumnMap::resolve(&headers(&["Sessions", "Landing page + query string"])).unwrap();
        assert_eq!(map.landing_page, "Landing page + query string");
    }

    #[test]
    fn test_narrow_rule_beats_earlier_broad_match() {
        let map = ColumnMap::resolve(&headers(&[
            "Landing page + query string",
            "Landing page",
            "Sessions",
        ]))
        .unwrap();
        assert_eq!(map.landing_page, "Landing page");
    }

    #[test]
    fn test_channel_header_never_wins_sessions() {
        let map = ColumnMap::resolve(&headers(&[
            "Session default channel group",
            "Engaged sessions",
        ]))
        .unwrap();

        assert_eq!(map.sessions, "Engaged sessions");
        assert_eq!(map.channel_grouping, "Session default channel group");
    }

    #[test]
    fn test_transaction_headers() {
        let map = ColumnMap::resolve(&headers(&["Sessions", "Ecommerce transactions"])).unwrap();
        assert_eq!(map.transactions, "Ecommerce transactions");

        let map = ColumnMap::resolve(&headers(&["Sessions", "key_events"])).unwrap();
        assert_eq!(map.transactions, "key_events");
    }

    #[test]
    fn test_alias_headers() {
        let map = ColumnMap::resolve(&headers(&["URL", "Visits", "Channel", "Conversions"])).unwrap();

        assert_eq!(map.landing_page, "URL");
        assert_eq!(map.sessions, "Visits");
        assert_eq!(map.channel_grouping, "Channel");
        assert_eq!(map.transactions, "Conversions");
    }

    #[test]
    fn test_defaults_for_unmatched_fields() {
        let found = headers(&["Sessions", "Users"]);
        let map = ColumnMap::resolve(&found).unwrap();

        assert_eq!(map.landing_page, "Landing page");
        assert_eq!(map.channel_grouping, "Session default channel group");
        assert_eq!(map.transactions, "Key events");
        assert_eq!(
            map.unmatched(&found),
            vec![
                CanonicalField::LandingPage,
                CanonicalField::ChannelGrouping,
                CanonicalField::Transactions,
            ]
        );
    }

    #[test]
    fn test_missing_sessions_is_schema_error() {
        let err = ColumnMap::resolve(&headers(&["Landing page", "Users", "Key events"])).unwrap_err();

        assert_eq!(err.expected, "Sessions");
        assert_eq!(err.found.len(), 3);
    }

    #[test]
    fn test_resolve_from_first_row_keys() {
        let row = json!({ "landing page": "/a", "SESSIONS": "60", "channel": "Paid", "Transactions": "12" });
        let rows = vec![row.as_object().unwrap().clone()];

        let map = resolve_columns(&rows).unwrap().unwrap();
        assert_eq!(map.landing_page, "landing page");
        assert_eq!(map.sessions, "SESSIONS");
        assert_eq!(map.channel_grouping, "channel");
        assert_eq!(map.transactions, "Transactions");
    }

    #[test]
    fn test_resolve_without_rows() {
        assert!(resolve_columns(&[]).unwrap().is_none());
    }

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(COMPILED_RULES.len(), COLUMN_RULES.len());
        for field in CanonicalField::ALL {
            assert!(COLUMN_RULES.iter().any(|r| r.field == field));
        }
    }
}
