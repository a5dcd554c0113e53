//! Minimum-activity and URL exclusion rules.

use super::diagnostics::ExclusionReason;
use super::pipeline::PipelineOptions;
use crate::models::PageCandidate;

/// Check one candidate against the business rules.
///
/// Checks run in order: sessions, transactions, URL terms. The first
/// failing check is reported. Sessions below 1 are always rejected so the
/// conversion rate is defined even with a zero threshold.
pub fn check(candidate: &PageCandidate, options: &PipelineOptions) -> Result<(), ExclusionReason> {
    let min_sessions = options.min_sessions.max(1);
    if candidate.sessions < min_sessions {
        return Err(ExclusionReason::BelowMinSessions {
            sessions: candidate.sessions,
            min: min_sessions,
        });
    }

    let min_transactions = options.min_transactions.max(0);
    if candidate.transactions < min_transactions {
        return Err(ExclusionReason::BelowMinTransactions {
            transactions: candidate.transactions,
            min: min_transactions,
        });
    }

    if let Some(term) = excluded_term(&candidate.landing_page, &options.excluded_terms) {
        return Err(ExclusionReason::ExcludedUrl {
            term: term.to_string(),
        });
    }

    Ok(())
}

/// First excluded term found in the lower-cased landing page.
pub fn excluded_term<'a>(landing_page: &str, terms: &'a [String]) -> Option<&'a str> {
    let page = landing_page.to_lowercase();
    terms
        .iter()
        .map(String::as_str)
        .find(|term| !term.is_empty() && page.contains(&term.to_lowercase()))
}

/// Whether the landing page is the bare site root.
pub fn is_root_page(landing_page: &str) -> bool {
    landing_page == "/"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(page: &str, sessions: i64, transactions: i64) -> PageCandidate {
        PageCandidate {
            row: 0,
            landing_page: page.into(),
            channel_grouping: "Organic".into(),
            sessions,
            transactions,
        }
    }

    #[test]
    fn test_qualifying_row() {
        let options = PipelineOptions::default();
        assert!(check(&candidate("/shoes", 50, 10), &options).is_ok());
    }

    #[test]
    fn test_thresholds() {
        let options = PipelineOptions::default();

        assert_eq!(
            check(&candidate("/shoes", 49, 30), &options),
            Err(ExclusionReason::BelowMinSessions { sessions: 49, min: 50 })
        );
        assert_eq!(
            check(&candidate("/shoes", 500, 9), &options),
            Err(ExclusionReason::BelowMinTransactions { transactions: 9, min: 10 })
        );
    }

    #[test]
    fn test_excluded_urls_case_insensitive() {
        let options = PipelineOptions::default();

        for page in ["/Book-now", "/CHECKOUT/step-2", "/thanks?purchase=1", "/booking"] {
            assert!(
                matches!(check(&candidate(page, 100, 20), &options), Err(ExclusionReason::ExcludedUrl { .. })),
                "{} should be excluded",
                page
            );
        }
    }

    #[test]
    fn test_sessions_check_runs_first() {
        let options = PipelineOptions::default();
        assert!(matches!(
            check(&candidate("/checkout", 10, 2), &options),
            Err(ExclusionReason::BelowMinSessions { .. })
        ));
    }

    #[test]
    fn test_zero_threshold_still_rejects_zero_sessions() {
        let options = PipelineOptions {
            min_sessions: 0,
            min_transactions: 0,
            ..PipelineOptions::default()
        };

        assert!(check(&candidate("/a", 0, 0), &options).is_err());
        assert!(check(&candidate("/a", 1, 0), &options).is_ok());
    }

    #[test]
    fn test_negative_counts_rejected() {
        let options = PipelineOptions::default();
        assert!(check(&candidate("/a", -100, 20), &options).is_err());
        assert!(check(&candidate("/a", 100, -20), &options).is_err());
    }

    #[test]
    fn test_root_page() {
        assert!(is_root_page("/"));
        assert!(!is_root_page("/home"));
        assert!(!is_root_page(" /"));
    }
}
