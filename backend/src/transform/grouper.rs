//! Partition qualifying landing pages by marketing channel.
//!
//! ```text
//! Records                           Channel groups
//! ┌──────────────────────────┐      ┌─────────────────────────┐
//! │ /shoes   Organic  20.0%  │      │ Organic                 │
//! │ /promo   Paid     12.5%  │  →   │   /shoes, /boots        │
//! │ /boots   Organic   8.1%  │      ├─────────────────────────┤
//! └──────────────────────────┘      │ Paid                    │
//!                                   │   /promo                │
//!                                   └─────────────────────────┘
//! ```
//!
//! Channel names are used verbatim: `Organic` and `organic` are two groups.
//! Groups come out in the order their channel was first seen.

use std::collections::HashMap;

use super::diagnostics::{DiagnosticSink, Exclusion, ExclusionReason};
use super::rules::is_root_page;
use crate::models::LandingPageRecord;

/// Records sharing one channel, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup {
    pub channel: String,
    pub records: Vec<LandingPageRecord>,
}

/// Group records by channel.
///
/// With `exclude_root_page`, records whose landing page is exactly `/` are
/// reported to `sink` and left out of every group.
pub fn group_by_channel(
    records: &[LandingPageRecord],
    exclude_root_page: bool,
    sink: &mut dyn DiagnosticSink,
) -> Vec<ChannelGroup> {
    let mut groups: Vec<ChannelGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if exclude_root_page && is_root_page(record.landing_page()) {
            sink.exclude(Exclusion {
                row: record.row(),
                landing_page: Some(record.landing_page().to_string()),
                reason: ExclusionReason::RootPage,
            });
            continue;
        }

        let slot = *index.entry(record.channel_grouping()).or_insert_with(|| {
            groups.push(ChannelGroup {
                channel: record.channel_grouping().to_string(),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record.clone());
    }

    groups
}
