//! Time-ordered ids for index keys.
//!
//! Ids are derived from a caller-supplied timestamp (an entry's creation time,
//! not the wall clock), so the archive can index items that were created years
//! before they were fetched.
//!
//! # ID Structure
//!
//! ```text
//! | 42 bits: timestamp (ms since Unix epoch) | 12 bits: worker | 10 bits: sequence |
//! ```
//!
//! - **Forward ids** store the timestamp as-is: ascending ids are ascending time.
//! - **Reverse ids** store `TIMESTAMP_MASK - timestamp`: ascending ids are
//!   descending time, so a forward key scan yields newest items first.
//! - **Worker** separates generators in different processes.
//! - **Sequence** is a rolling counter that keeps ids distinct for equal
//!   timestamps (up to 1024 ids per timestamp per worker).
//!
//! Written big-endian, byte order of the ids equals numeric order.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rand::Rng;

/// Number of bits used for the timestamp portion.
pub const TIMESTAMP_BITS: u32 = 42;

/// Number of bits used for the worker ID.
pub const WORKER_BITS: u32 = 12;

/// Number of bits used for the sequence portion.
pub const SEQUENCE_BITS: u32 = 10;

/// Largest representable timestamp (ms since Unix epoch, year 2109).
pub const TIMESTAMP_MASK: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Mask for extracting the worker ID (12 bits).
pub const WORKER_MASK: u64 = (1 << WORKER_BITS) - 1;

/// Mask for extracting the sequence portion (10 bits).
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Generator for forward and reverse time-ordered ids.
///
/// Each instance owns its sequence counter; share one instance (behind an
/// `Arc`) between all writers of the same store.
#[derive(Debug)]
pub struct FlakeGenerator {
    worker: u64,
    sequence: Mutex<u64>,
}

impl FlakeGenerator {
    /// Creates a generator with an explicit worker id (masked to 12 bits).
    pub fn new(worker_id: u16) -> Self {
        Self { worker: u64::from(worker_id) & WORKER_MASK, sequence: Mutex::new(0) }
    }

    /// Creates a generator with a worker id drawn from OS entropy mixed with the PID.
    pub fn from_entropy() -> Self {
        let pid = u64::from(std::process::id());
        let worker = (rand::rng().random::<u64>() ^ pid) & WORKER_MASK;
        Self { worker, sequence: Mutex::new(0) }
    }

    /// Returns this generator's worker id.
    pub fn worker_id(&self) -> u64 {
        self.worker
    }

    /// Returns an id that sorts ascending with `ts`.
    pub fn forward_id(&self, ts: DateTime<Utc>) -> u64 {
        self.compose(clamp_millis(ts))
    }

    /// Returns an id that sorts descending with `ts`.
    pub fn reverse_id(&self, ts: DateTime<Utc>) -> u64 {
        self.compose(TIMESTAMP_MASK - clamp_millis(ts))
    }

    fn compose(&self, timestamp: u64) -> u64 {
        let sequence = {
            let mut seq = self.sequence.lock();
            let current = *seq;
            *seq = (current + 1) & SEQUENCE_MASK;
            current
        };
        (timestamp << (WORKER_BITS + SEQUENCE_BITS)) | (self.worker << SEQUENCE_BITS) | sequence
    }
}

impl Default for FlakeGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Converts a timestamp to milliseconds since the Unix epoch, clamped to the 42-bit range.
fn clamp_millis(ts: DateTime<Utc>) -> u64 {
    let millis = ts.timestamp_millis();
    if millis <= 0 {
        0
    } else {
        (millis as u64).min(TIMESTAMP_MASK)
    }
}

/// Extracts the raw timestamp bits from an id.
#[must_use]
pub fn extract_timestamp(id: u64) -> u64 {
    id >> (WORKER_BITS + SEQUENCE_BITS)
}

/// Extracts the worker ID portion from an id.
#[must_use]
pub fn extract_worker(id: u64) -> u64 {
    (id >> SEQUENCE_BITS) & WORKER_MASK
}

/// Extracts the sequence portion from an id.
#[must_use]
pub fn extract_sequence(id: u64) -> u64 {
    id & SEQUENCE_MASK
}

/// Recovers the (millisecond precision) time encoded in a forward id.
pub fn timestamp_of_forward(id: u64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(extract_timestamp(id) as i64).single()
}

/// Recovers the (millisecond precision) time encoded in a reverse id.
pub fn timestamp_of_reverse(id: u64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt((TIMESTAMP_MASK - extract_timestamp(id)) as i64).single()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_bit_allocation() {
        assert_eq!(TIMESTAMP_BITS + WORKER_BITS + SEQUENCE_BITS, 64);
        assert_eq!(WORKER_MASK, 0xFFF);
        assert_eq!(SEQUENCE_MASK, 0x3FF);
    }

    #[test]
    fn test_forward_ids_ascend_with_time() {
        let generator = FlakeGenerator::new(7);
        let early = generator.forward_id(ts("2008-01-01T00:00:00Z"));
        let late = generator.forward_id(ts("2012-06-01T00:00:00Z"));
        assert!(early < late);
        assert!(early.to_be_bytes() < late.to_be_bytes());
    }

    #[test]
    fn test_reverse_ids_descend_with_time() {
        let generator = FlakeGenerator::new(7);
        let early = generator.reverse_id(ts("2024-01-01T00:00:00Z"));
        let late = generator.reverse_id(ts("2024-06-01T00:00:00Z"));
        assert!(late < early, "newer timestamps must sort first");
        assert!(late.to_be_bytes() < early.to_be_bytes());
    }

    #[test]
    fn test_equal_timestamps_produce_distinct_ids() {
        let generator = FlakeGenerator::new(1);
        let t = ts("2010-10-10T10:10:10Z");
        let ids: HashSet<u64> = (0..1024).map(|_| generator.reverse_id(t)).collect();
        assert_eq!(ids.len(), 1024);
    }

    #[test]
    fn test_id_structure() {
        let generator = FlakeGenerator::new(0xABC);
        let t = ts("2011-02-03T04:05:06.789Z");
        let id = generator.forward_id(t);

        assert_eq!(extract_worker(id), 0xABC);
        assert_eq!(extract_sequence(id), 0);
        assert_eq!(timestamp_of_forward(id), Some(t));

        let reverse = generator.reverse_id(t);
        assert_eq!(extract_sequence(reverse), 1);
        assert_eq!(timestamp_of_reverse(reverse), Some(t));
    }

    #[test]
    fn test_worker_id_is_masked() {
        let generator = FlakeGenerator::new(u16::MAX);
        assert_eq!(generator.worker_id(), WORKER_MASK);
    }

    #[test]
    fn test_pre_epoch_timestamps_clamp_to_zero() {
        let generator = FlakeGenerator::new(0);
        let id = generator.forward_id(ts("1960-01-01T00:00:00Z"));
        assert_eq!(extract_timestamp(id), 0);
        let reverse = generator.reverse_id(ts("1960-01-01T00:00:00Z"));
        assert_eq!(extract_timestamp(reverse), TIMESTAMP_MASK);
    }

    #[test]
    fn test_sequence_wraps() {
        let generator = FlakeGenerator::new(0);
        let t = ts("2015-01-01T00:00:00Z");
        for _ in 0..SEQUENCE_MASK {
            generator.forward_id(t);
        }
        let last = generator.forward_id(t);
        assert_eq!(extract_sequence(last), SEQUENCE_MASK);
        let wrapped = generator.forward_id(t);
        assert_eq!(extract_sequence(wrapped), 0);
    }

    proptest! {
        #[test]
        fn reverse_order_is_inverse_of_time_order(
            a in 0i64..4_000_000_000_000,
            b in 0i64..4_000_000_000_000,
        ) {
            prop_assume!(a != b);
            let generator = FlakeGenerator::new(3);
            let ta = Utc.timestamp_millis_opt(a).single().unwrap();
            let tb = Utc.timestamp_millis_opt(b).single().unwrap();
            let ra = generator.reverse_id(ta);
            let rb = generator.reverse_id(tb);
            prop_assert_eq!(a < b, ra.to_be_bytes() > rb.to_be_bytes());
        }
    }
}
