//! Prefix scans.
//!
//! [`forward_scan`] walks every pair whose key starts with a prefix, in key
//! order, and hands each one to a callback. The callback steers the scan with
//! a three-way result: `Ok(Continue)`, `Ok(Stop)` (ends the scan as a success)
//! or `Err` (ends it as a failure). The engine iterator is owned by the scan and
//! dropped on every return path.

use feedarchive_store::KvEngine;
use snafu::{ResultExt, Snafu};
use tracing::debug;

/// What the scan does after a callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    /// Move on to the next pair.
    Continue,
    /// End the scan successfully; the current pair is not counted.
    Stop,
}

/// Failure of a [`forward_scan`].
///
/// `scanned` is the number of pairs fully processed before the failure.
#[derive(Debug, Snafu)]
pub enum ScanError<E>
where
    E: std::error::Error + 'static,
{
    /// The callback returned an error.
    #[snafu(display("Scan callback failed after {scanned} pairs: {source}"))]
    Callback {
        /// Pairs processed before the failing one.
        scanned: usize,
        /// The callback's error.
        source: E,
    },
    /// The engine failed to open, seek or advance the iterator.
    #[snafu(display("Scan engine error after {scanned} pairs: {source}"))]
    Engine {
        /// Pairs processed before the failure.
        scanned: usize,
        /// The engine error.
        source: feedarchive_store::Error,
    },
}

impl<E: std::error::Error + 'static> ScanError<E> {
    /// Pairs processed before the failure.
    pub fn scanned(&self) -> usize {
        match self {
            Self::Callback { scanned, .. } | Self::Engine { scanned, .. } => *scanned,
        }
    }
}

type ScanResult<T, E> = std::result::Result<T, ScanError<E>>;

/// Calls `callback(index, key, value)` for each pair under `prefix`, in key order.
///
/// Returns the number of pairs processed: all of them, or those before the
/// pair whose callback returned [`ScanControl::Stop`].
///
/// # Errors
///
/// Returns [`ScanError::Callback`] when the callback fails and
/// [`ScanError::Engine`] when the iterator fails, each with the count so far.
pub fn forward_scan<K, F, E>(
    engine: &K,
    prefix: &[u8],
    mut callback: F,
) -> std::result::Result<usize, ScanError<E>>
where
    K: KvEngine + ?Sized,
    F: FnMut(usize, &[u8], &[u8]) -> std::result::Result<ScanControl, E>,
    E: std::error::Error + 'static,
{
    let opened: ScanResult<_, E> = engine.iter().context(EngineSnafu { scanned: 0usize });
    let mut iter = opened?;
    let sought: ScanResult<_, E> = iter.seek(prefix).context(EngineSnafu { scanned: 0usize });
    sought?;

    let mut scanned = 0;
    while let Some((key, value)) = iter.current() {
        if !key.starts_with(prefix) {
            break;
        }
        let control: ScanResult<_, E> =
            callback(scanned, key, value).context(CallbackSnafu { scanned });
        if control? == ScanControl::Stop {
            debug!(scanned, "Scan stopped by callback");
            return Ok(scanned);
        }
        scanned += 1;
        let advanced: ScanResult<_, E> = iter.next().context(EngineSnafu { scanned });
        advanced?;
    }

    debug!(scanned, "Scan completed");
    Ok(scanned)
}
