//! Aggregation of stored records into the five report summaries.
//!
//! `Aggregator` keeps every summary as a running tally, so records can be
//! pushed one at a time; `aggregate` is the batch form over a slice.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::record::PacketRecord;

mod histogram;
mod talkers;
mod timeseries;

pub use histogram::HistogramBucket;
pub use talkers::Talker;
pub use timeseries::{TimeBucket, TimePoint};

use histogram::LengthTally;
use talkers::TalkerTally;
use timeseries::TimeSeriesTally;

pub const DEFAULT_HISTOGRAM_BINS: usize = 50;
pub const DEFAULT_TOP_TALKERS: usize = 10;

/// Tunables for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub histogram_bins: usize,
    /// Maximum number of talkers kept.
    pub top_talkers: usize,
    pub time_bucket: TimeBucket,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            top_talkers: DEFAULT_TOP_TALKERS,
            time_bucket: TimeBucket::default(),
        }
    }
}

/// The five summaries plus the capture window they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub total_packets: u64,
    pub time_start: Option<OffsetDateTime>,
    pub time_end: Option<OffsetDateTime>,
    pub histogram: Vec<HistogramBucket>,
    pub packets_over_time: Vec<TimePoint>,
    /// Latest length per bucket, not a sum.
    pub size_over_time: Vec<TimePoint>,
    pub protocols: BTreeMap<String, u64>,
    pub top_talkers: Vec<Talker>,
}

/// Incremental form of `aggregate`.
///
/// # Examples
/// ```
/// use time::macros::datetime;
/// use trafficlens_core::{Aggregator, AnalysisConfig, PacketRecord};
///
/// let mut aggregator = Aggregator::new(AnalysisConfig::default());
/// aggregator.push(&PacketRecord::new(
///     datetime!(2024-01-01 00:00:00 UTC),
///     "10.0.0.1",
///     "10.0.0.2",
///     "TCP",
///     1500,
/// ));
/// let result = aggregator.finish();
/// assert_eq!(result.total_packets, 1);
/// assert_eq!(result.protocols["TCP"], 1);
/// ```
#[derive(Debug)]
pub struct Aggregator {
    config: AnalysisConfig,
    total_packets: u64,
    time_start: Option<OffsetDateTime>,
    time_end: Option<OffsetDateTime>,
    lengths: LengthTally,
    series: TimeSeriesTally,
    protocols: BTreeMap<String, u64>,
    talkers: TalkerTally,
}

impl Aggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            total_packets: 0,
            time_start: None,
            time_end: None,
            lengths: LengthTally::default(),
            series: TimeSeriesTally::default(),
            protocols: BTreeMap::new(),
            talkers: TalkerTally::default(),
        }
    }

    pub fn push(&mut self, record: &PacketRecord) {
        self.total_packets += 1;
        update_bounds(&mut self.time_start, &mut self.time_end, record.timestamp());

        self.lengths.push(record.length());
        self.series.push(
            self.config.time_bucket.truncate(record.timestamp()),
            record.length(),
        );
        *self
            .protocols
            .entry(record.protocol().to_string())
            .or_default() += 1;
        self.talkers.push(record.source_address());
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn finish(self) -> AnalysisResult {
        let (packets_over_time, size_over_time) = self.series.into_series();
        AnalysisResult {
            total_packets: self.total_packets,
            time_start: self.time_start,
            time_end: self.time_end,
            histogram: self.lengths.into_buckets(self.config.histogram_bins),
            packets_over_time,
            size_over_time,
            protocols: self.protocols,
            top_talkers: self.talkers.into_top(self.config.top_talkers),
        }
    }
}

/// Aggregate a record sequence in one pass. Empty input yields empty
/// summaries.
pub fn aggregate(records: &[PacketRecord], config: &AnalysisConfig) -> AnalysisResult {
    let mut aggregator = Aggregator::new(*config);
    for record in records {
        aggregator.push(record);
    }
    aggregator.finish()
}

fn update_bounds(
    start: &mut Option<OffsetDateTime>,
    end: &mut Option<OffsetDateTime>,
    ts: OffsetDateTime,
) {
    if start.is_none_or(|s| ts < s) {
        *start = Some(ts);
    }
    if end.is_none_or(|e| ts > e) {
        *end = Some(ts);
    }
}
