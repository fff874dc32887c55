// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keep-last sample queue backing one subscription.

use super::Sample;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Bounded FIFO that evicts the oldest sample when full.
pub(crate) struct SampleQueue {
    depth: usize,
    samples: Mutex<VecDeque<Sample>>,
}

impl SampleQueue {
    pub(crate) fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            samples: Mutex::new(VecDeque::with_capacity(depth)),
        }
    }

    /// Push a sample. Returns `true` when the oldest sample was evicted.
    pub(crate) fn push(&self, sample: Sample) -> bool {
        let mut samples = self.samples.lock();
        let evicted = if samples.len() >= self.depth {
            samples.pop_front();
            true
        } else {
            false
        };
        samples.push_back(sample);
        evicted
    }

    pub(crate) fn pop(&self) -> Option<Sample> {
        self.samples.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(seq: u64) -> Sample {
        Sample {
            topic: "gps".into(),
            type_name: "GPS".into(),
            sequence_number: seq,
            timestamp_nanos: 0,
            payload: Arc::from(&b"{}"[..]),
        }
    }

    #[test]
    fn test_keep_last_evicts_oldest() {
        let queue = SampleQueue::new(2);
        assert!(!queue.push(sample(1)));
        assert!(!queue.push(sample(2)));
        assert!(queue.push(sample(3)));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|s| s.sequence_number), Some(2));
        assert_eq!(queue.pop().map(|s| s.sequence_number), Some(3));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_zero_depth_is_clamped() {
        let queue = SampleQueue::new(0);
        assert_eq!(queue.depth(), 1);
        queue.push(sample(1));
        queue.push(sample(2));
        assert_eq!(queue.pop().map(|s| s.sequence_number), Some(2));
    }
}
