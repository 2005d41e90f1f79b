//! Bounded record of recent publishes, kept for diagnostics.
use std::collections::VecDeque;

use serde::Serialize;

pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// One publish as seen by the bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishRecord {
    pub sequence: u64,
    pub channel: String,
    pub summary: String,
    pub subscribers: usize,
}

/// Rolling log of publishes; the oldest record is dropped once full.
#[derive(Debug)]
pub struct PublishHistory {
    capacity: usize,
    next_sequence: u64,
    records: VecDeque<PublishRecord>,
}

impl PublishHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_sequence: 0,
            records: VecDeque::new(),
        }
    }

    pub fn record(&mut self, channel: &str, summary: String, subscribers: usize) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(PublishRecord {
            sequence,
            channel: channel.to_string(),
            summary,
            subscribers,
        });
        sequence
    }

    pub fn records(&self) -> impl Iterator<Item = &PublishRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for PublishHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
