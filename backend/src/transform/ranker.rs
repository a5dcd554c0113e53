//! Best and worst landing pages per channel.
//!
//! A channel's records are sorted by conversion rate (highest first, ties
//! keep input order). The first `n` form the top slice. The bottom slice
//! takes up to `n` of the lowest-rated records that are not already in
//! the top slice, so a channel of six yields one bottom record and a
//! channel of `n` or fewer yields none. Each slice is then shown by
//! session volume, highest first.

use super::grouper::ChannelGroup;
use crate::models::{ChannelResult, LandingPageRecord};

/// Rank one channel group.
pub fn rank_channel(group: ChannelGroup, slice_size: usize) -> ChannelResult {
    let mut sorted = group.records;
    sorted.sort_by(|a, b| b.conversion_rate().total_cmp(&a.conversion_rate()));

    let len = sorted.len();
    let top_len = slice_size.min(len);
    let bottom_start = top_len.max(len.saturating_sub(slice_size));

    let mut bottom: Vec<LandingPageRecord> = sorted.split_off(bottom_start);
    bottom.reverse();
    sorted.truncate(top_len);
    let mut top = sorted;

    sort_by_sessions(&mut top);
    sort_by_sessions(&mut bottom);

    ChannelResult {
        channel_name: group.channel,
        top5: top,
        bottom5: bottom,
    }
}

/// Rank every group, keeping group order.
pub fn rank_channels(groups: Vec<ChannelGroup>, slice_size: usize) -> Vec<ChannelResult> {
    groups
        .into_iter()
        .map(|group| rank_channel(group, slice_size))
        .collect()
}

fn sort_by_sessions(records: &mut [LandingPageRecord]) {
    records.sort_by(|a, b| b.sessions().cmp(&a.sessions()));
}
