//! Transformation module.
//!
//! Stages, in the order the pipeline runs them:
//! - Columns: header names to canonical fields
//! - Normalize: presence and integer checks
//! - Rules: minimum activity and URL exclusions
//! - Metrics: conversion rate
//! - Grouper: rows by channel
//! - Ranker: top and bottom pages per channel
//! - Pipeline: orchestration

pub mod columns;
pub mod diagnostics;
pub mod grouper;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod ranker;
pub mod rules;

pub use columns::{resolve_columns, CanonicalField, ColumnMap};
pub use diagnostics::{DiagnosticSink, Exclusion, ExclusionLog, ExclusionReason, NoopSink};
pub use grouper::{group_by_channel, ChannelGroup};
pub use pipeline::*;
pub use ranker::{rank_channel, rank_channels};
