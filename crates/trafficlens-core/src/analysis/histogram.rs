use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One equal-width histogram bin over packet lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Upper bound; inclusive only for the last bin.
    pub upper: f64,
    pub count: u64,
}

/// Running tally of observed lengths. Keeping distinct lengths only makes the
/// final binning independent of how many records were pushed.
#[derive(Debug, Default)]
pub(crate) struct LengthTally {
    counts: BTreeMap<u32, u64>,
}

impl LengthTally {
    pub(crate) fn push(&mut self, length: u32) {
        *self.counts.entry(length).or_default() += 1;
    }

    pub(crate) fn into_buckets(self, bins: usize) -> Vec<HistogramBucket> {
        let (Some((&min, _)), Some((&max, _))) =
            (self.counts.first_key_value(), self.counts.last_key_value())
        else {
            return Vec::new();
        };
        let bins = bins.max(1);
        let min = f64::from(min);
        let max = f64::from(max);
        let width = (max - min) / bins as f64;

        let mut buckets: Vec<HistogramBucket> = (0..bins)
            .map(|i| HistogramBucket {
                lower: min + width * i as f64,
                upper: if i + 1 == bins {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for (&length, &count) in &self.counts {
            buckets[bin_index(f64::from(length), min, max, bins)].count += count;
        }
        buckets
    }
}

fn bin_index(value: f64, min: f64, max: f64, bins: usize) -> usize {
    if max <= min {
        return 0;
    }
    let index = ((value - min) / (max - min) * bins as f64) as usize;
    index.min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(lengths: &[u32], bins: usize) -> Vec<HistogramBucket> {
        let mut tally = LengthTally::default();
        for &length in lengths {
            tally.push(length);
        }
        tally.into_buckets(bins)
    }

    #[test]
    fn empty_tally_has_no_buckets() {
        assert!(buckets(&[], 50).is_empty());
    }

    #[test]
    fn bounds_span_observed_range() {
        let result = buckets(&[100, 200, 300, 1100], 10);
        assert_eq!(result.len(), 10);
        assert_eq!(result[0].lower, 100.0);
        assert_eq!(result[0].upper, 200.0);
        assert_eq!(result[9].upper, 1100.0);
        assert_eq!(result[0].count, 1);
        assert_eq!(result[1].count, 1);
        assert_eq!(result[2].count, 1);
        // The maximum belongs to the last bin.
        assert_eq!(result[9].count, 1);
        assert_eq!(result.iter().map(|b| b.count).sum::<u64>(), 4);
    }

    #[test]
    fn single_value_lands_in_first_bin() {
        let result = buckets(&[64, 64, 64], 50);
        assert_eq!(result.len(), 50);
        assert_eq!(result[0].count, 3);
        assert!(result[1..].iter().all(|b| b.count == 0));
        assert!(result.iter().all(|b| b.lower == 64.0 && b.upper == 64.0));
    }

    #[test]
    fn zero_bins_is_treated_as_one() {
        let result = buckets(&[1, 2, 3], 0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].count, 3);
    }
}
