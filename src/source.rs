//! ScanSource - where decoded scan payloads come from.

use std::collections::VecDeque;

use crate::record::ScanEvent;

/// Delivers one decoded scan at a time. `None` means no new scan.
pub trait ScanSource {
    fn next_scan(&mut self) -> Option<ScanEvent>;
}

/// Queue-backed scan source for manual input and tests.
///
/// `push` assigns increasing sequence numbers, one per physical scan;
/// `redeliver` repeats the last event unchanged, as a camera widget does when
/// it reports the same decode twice.
#[derive(Debug, Default)]
pub struct VecScanSource {
    pending: VecDeque<ScanEvent>,
    last: Option<ScanEvent>,
    next_sequence: u64,
}

impl VecScanSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut source = Self::new();
        for value in values {
            source.push(value);
        }
        source
    }

    /// Queue a new physical scan. Returns its sequence number.
    pub fn push(&mut self, value: impl Into<String>) -> u64 {
        self.next_sequence += 1;
        let event = ScanEvent::new(self.next_sequence, value);
        self.last = Some(event.clone());
        self.pending.push_back(event);
        self.next_sequence
    }

    /// Queue the previous event again without a new physical scan.
    pub fn redeliver(&mut self) {
        if let Some(event) = self.last.clone() {
            self.pending.push_back(event);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl ScanSource for VecScanSource {
    fn next_scan(&mut self) -> Option<ScanEvent> {
        self.pending.pop_front()
    }
}
