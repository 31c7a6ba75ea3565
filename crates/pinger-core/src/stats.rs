use crate::types::Sequence;
use std::time::Duration;

/// Running round-trip statistics for a ping run.
///
/// RTT aggregates are held as a running sum and sum-of-squares (seconds) so
/// mean and standard deviation can be computed without retaining samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PingStats {
    /// The number of probes sent.
    pub sent: usize,
    /// The number of unique replies received.
    pub received: usize,
    /// The number of duplicate replies received.
    pub duplicates: usize,
    /// The number of ICMP errors received.
    pub errors: usize,
    samples: usize,
    min: f64,
    max: f64,
    sum: f64,
    sum_squares: f64,
}

impl PingStats {
    pub(crate) fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub(crate) fn record_received(&mut self) {
        self.received += 1;
    }

    pub(crate) fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }

    pub(crate) fn record_rtt(&mut self, rtt: Duration) {
        let secs = rtt.as_secs_f64();
        if self.samples == 0 || secs < self.min {
            self.min = secs;
        }
        if secs > self.max {
            self.max = secs;
        }
        self.sum += secs;
        self.sum_squares += secs * secs;
        self.samples += 1;
    }

    /// The percentage of probes which went unanswered, rounded down.
    #[must_use]
    pub const fn loss_percent(&self) -> usize {
        if self.sent == 0 {
            0
        } else {
            let received = if self.received > self.sent {
                self.sent
            } else {
                self.received
            };
            (self.sent - received) * 100 / self.sent
        }
    }

    /// Whether any timed replies were recorded.
    #[must_use]
    pub const fn has_rtt(&self) -> bool {
        self.samples > 0
    }

    /// The minimum RTT in seconds, if any replies were timed.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.has_rtt().then_some(self.min)
    }

    /// The maximum RTT in seconds, if any replies were timed.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.has_rtt().then_some(self.max)
    }

    /// The mean RTT in seconds, if any replies were timed.
    #[must_use]
    pub fn avg(&self) -> Option<f64> {
        self.has_rtt().then(|| self.sum / self.samples as f64)
    }

    /// The RTT standard deviation in seconds, if any replies were timed.
    #[must_use]
    pub fn stdev(&self) -> Option<f64> {
        self.avg()
            .map(|avg| (self.sum_squares / self.samples as f64 - avg * avg).max(0.0).sqrt())
    }
}

const BITMAP_WORDS: usize = (u16::MAX as usize + 1) / 64;

/// The disposition of a reply sequence number.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum ReplyDisposition {
    /// The first reply to an awaited sequence.
    First,
    /// A repeat reply to an already answered sequence.
    Duplicate,
    /// A sequence that was never sent.
    Unknown,
}

/// Tracks which sequence numbers are awaited and which have been answered.
///
/// One bit per possible sequence number, in two bitmaps.
pub(crate) struct SequenceTracker {
    awaited: Vec<u64>,
    answered: Vec<u64>,
    outstanding: usize,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self {
            awaited: vec![0; BITMAP_WORDS],
            answered: vec![0; BITMAP_WORDS],
            outstanding: 0,
        }
    }

    /// Record a sent probe, re-arming the sequence if it has wrapped.
    pub fn record_sent(&mut self, sequence: Sequence) {
        let (word, bit) = Self::index(sequence);
        let was_awaited = self.awaited[word] & bit != 0;
        let was_answered = self.answered[word] & bit != 0;
        self.awaited[word] |= bit;
        self.answered[word] &= !bit;
        if !was_awaited || was_answered {
            self.outstanding += 1;
        }
    }

    /// Classify and record a reply sequence number.
    pub fn record_reply(&mut self, sequence: Sequence) -> ReplyDisposition {
        let (word, bit) = Self::index(sequence);
        if self.awaited[word] & bit == 0 {
            ReplyDisposition::Unknown
        } else if self.answered[word] & bit != 0 {
            ReplyDisposition::Duplicate
        } else {
            self.answered[word] |= bit;
            self.outstanding -= 1;
            ReplyDisposition::First
        }
    }

    /// The number of sent probes not yet accounted for.
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    const fn index(sequence: Sequence) -> (usize, u64) {
        let seq = sequence.0 as usize;
        (seq / 64, 1 << (seq % 64))
    }
}
