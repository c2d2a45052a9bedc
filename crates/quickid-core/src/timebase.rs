//! Monotonic millisecond timebase

use quickid_util::{Clock, SystemClock, WaitStrategy};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Source of non-decreasing millisecond timestamps
pub trait TimestampSource {
    /// Return a timestamp that is at least `min_time` and never below any
    /// value returned before, blocking until the clock reaches `min_time`.
    ///
    /// A `min_time` at or below the current clock reading never blocks.
    fn newer_timestamp(&mut self, min_time: i64) -> i64;

    /// The most recent value handed out (0 before the first call)
    fn last_timestamp(&self) -> i64;

    /// Return a timestamp strictly greater than `last_timestamp()`
    fn advance_past_last(&mut self) -> i64 {
        let last = self.last_timestamp();
        self.newer_timestamp(last + 1)
    }
}

/// Wraps a wall clock so that the timestamps it hands out never decrease.
///
/// The underlying clock may stall (the same millisecond observed repeatedly)
/// or move backwards; `Timebase` hides both by never returning a value below
/// the last one it returned.
#[derive(Debug)]
pub struct Timebase<C: Clock = SystemClock> {
    clock: C,
    last_timestamp: i64,
    wait: WaitStrategy,
}

impl Timebase {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Timebase<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            last_timestamp: 0,
            wait: WaitStrategy::default(),
        }
    }

    pub fn with_wait_strategy(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Hand out a safe timestamp of at least `min_time`.
    ///
    /// Pass 0 (or anything at or below the current clock) for a plain,
    /// non-blocking read. A `min_time` ahead of the clock blocks the calling
    /// thread, re-reading the clock per the wait strategy, until the clock
    /// reaches it. The result is stored as the new last timestamp.
    pub fn get_newer_timestamp(&mut self, min_time: i64) -> i64 {
        let mut now = self.clock.now_millis();

        if min_time > now {
            trace!(min_time, now, strategy = self.wait.name(), "Waiting for clock");
            while now < min_time {
                self.wait.pause();
                now = self.clock.now_millis();
            }
            trace!(min_time, now, "Clock reached requested time");
        }

        if now < self.last_timestamp {
            debug!(
                now,
                last_timestamp = self.last_timestamp,
                "Wall clock behind last timestamp, holding"
            );
        }

        self.last_timestamp = self.last_timestamp.max(now);
        self.last_timestamp
    }

    /// The most recent value handed out (0 before the first call)
    pub fn last_timestamp(&self) -> i64 {
        self.last_timestamp
    }

    /// Hand out a timestamp strictly greater than `t`, waiting if needed
    pub fn advance_past(&mut self, t: i64) -> i64 {
        self.get_newer_timestamp(t + 1)
    }
}

impl<C: Clock> TimestampSource for Timebase<C> {
    fn newer_timestamp(&mut self, min_time: i64) -> i64 {
        self.get_newer_timestamp(min_time)
    }

    fn last_timestamp(&self) -> i64 {
        self.last_timestamp
    }
}

/// A `Timebase` shared by several generators.
///
/// Every generator holding a clone sees one monotonic sequence of timestamps,
/// so IDs from different generators interleave in time order. Access is
/// serialized by a mutex; a forced wait holds the lock while it spins.
#[derive(Debug)]
pub struct SharedTimebase<C: Clock = SystemClock>(Arc<Mutex<Timebase<C>>>);

impl SharedTimebase {
    pub fn new() -> Self {
        Self::from_timebase(Timebase::new())
    }
}

impl Default for SharedTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Clone for SharedTimebase<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C: Clock> SharedTimebase<C> {
    pub fn from_timebase(timebase: Timebase<C>) -> Self {
        Self(Arc::new(Mutex::new(timebase)))
    }

    // The guarded state is a single integer, never left half-written,
    // so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Timebase<C>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_newer_timestamp(&self, min_time: i64) -> i64 {
        self.lock().get_newer_timestamp(min_time)
    }

    pub fn last_timestamp(&self) -> i64 {
        self.lock().last_timestamp()
    }

    /// Number of live handles to this timebase
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl<C: Clock> TimestampSource for SharedTimebase<C> {
    fn newer_timestamp(&mut self, min_time: i64) -> i64 {
        self.get_newer_timestamp(min_time)
    }

    fn last_timestamp(&self) -> i64 {
        self.lock().last_timestamp()
    }

    fn advance_past_last(&mut self) -> i64 {
        let mut timebase = self.lock();
        let last = timebase.last_timestamp();
        timebase.advance_past(last)
    }
}
