use std::collections::BTreeMap;

use time::OffsetDateTime;

/// Granularity that time series keys are truncated to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeBucket {
    Second,
    #[default]
    Millisecond,
    Microsecond,
}

impl TimeBucket {
    /// Drop sub-bucket precision from `ts`.
    ///
    /// # Examples
    /// ```
    /// use time::macros::datetime;
    /// use trafficlens_core::TimeBucket;
    ///
    /// let ts = datetime!(2024-01-01 00:00:00.123456 UTC);
    /// assert_eq!(TimeBucket::Second.truncate(ts), datetime!(2024-01-01 00:00:00 UTC));
    /// assert_eq!(
    ///     TimeBucket::Millisecond.truncate(ts),
    ///     datetime!(2024-01-01 00:00:00.123 UTC)
    /// );
    /// ```
    pub fn truncate(&self, ts: OffsetDateTime) -> OffsetDateTime {
        let nanos = ts.nanosecond();
        let kept = match self {
            TimeBucket::Second => 0,
            TimeBucket::Millisecond => nanos - nanos % 1_000_000,
            TimeBucket::Microsecond => nanos - nanos % 1_000,
        };
        // `kept` never exceeds the original nanosecond field.
        ts.replace_nanosecond(kept).unwrap_or(ts)
    }
}

/// One point of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePoint {
    pub timestamp: OffsetDateTime,
    pub value: u64,
}

/// Packet count per bucket plus the latest length seen in each bucket.
#[derive(Debug, Default)]
pub(crate) struct TimeSeriesTally {
    packets: BTreeMap<OffsetDateTime, u64>,
    sizes: BTreeMap<OffsetDateTime, u64>,
}

impl TimeSeriesTally {
    pub(crate) fn push(&mut self, key: OffsetDateTime, length: u32) {
        *self.packets.entry(key).or_default() += 1;
        self.sizes.insert(key, u64::from(length));
    }

    /// Returns `(packets_over_time, size_over_time)`, both ascending.
    pub(crate) fn into_series(self) -> (Vec<TimePoint>, Vec<TimePoint>) {
        (points(self.packets), points(self.sizes))
    }
}

fn points(map: BTreeMap<OffsetDateTime, u64>) -> Vec<TimePoint> {
    map.into_iter()
        .map(|(timestamp, value)| TimePoint { timestamp, value })
        .collect()
}
