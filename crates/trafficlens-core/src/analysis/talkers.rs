use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source address and the number of packets it sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talker {
    pub source: String,
    pub packets: u64,
}

#[derive(Debug)]
struct TalkerStats {
    first_seen: usize,
    packets: u64,
}

/// Per-source counters that remember encounter order for tie-breaking.
#[derive(Debug, Default)]
pub(crate) struct TalkerTally {
    stats: HashMap<String, TalkerStats>,
}

impl TalkerTally {
    pub(crate) fn push(&mut self, source: &str) {
        if let Some(entry) = self.stats.get_mut(source) {
            entry.packets += 1;
            return;
        }
        let first_seen = self.stats.len();
        self.stats.insert(
            source.to_string(),
            TalkerStats {
                first_seen,
                packets: 1,
            },
        );
    }

    /// Busiest `limit` sources, descending by count, earlier sources first on
    /// ties.
    pub(crate) fn into_top(self, limit: usize) -> Vec<Talker> {
        let mut ranked: Vec<(String, TalkerStats)> = self.stats.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.packets
                .cmp(&a.packets)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        ranked
            .into_iter()
            .take(limit)
            .map(|(source, stats)| Talker {
                source,
                packets: stats.packets,
            })
            .collect()
    }
}
