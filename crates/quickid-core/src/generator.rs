//! The QuickId generator

use quickid_util::{Clock, QuickIdError, Result};
use tracing::debug;

use crate::base32::{MIN_ID_LEN, SEQ_LIMIT};
use crate::parsed::{format_id, parse_id, ParsedId};
use crate::timebase::{SharedTimebase, Timebase, TimestampSource};

/// Generates compact, time-ordered ID strings.
///
/// Each ID is `<time><system tag><sequence>`: 9 base-32 digits of
/// milliseconds since the epoch, the tag verbatim, then 4 base-32 digits of
/// a rolling counter. IDs from one instance are strictly increasing as
/// strings. When the counter wraps, the generator waits for the timebase to
/// move past the last millisecond it used, so the smaller sequence still
/// lands in a larger ID.
///
/// Not synchronized: share an instance between threads behind a mutex.
///
/// # Example
/// ```
/// use quickid_core::QuickId;
///
/// let mut ids = QuickId::new("-node-a-");
/// let first = ids.get_id();
/// let second = ids.get_id();
/// assert!(first < second);
///
/// let parsed = ids.parse_id(&second).unwrap();
/// assert_eq!(parsed.sys, "-node-a-");
/// ```
#[derive(Debug)]
pub struct QuickId<T: TimestampSource = Timebase> {
    system_tag: String,
    sequence: u32,
    timebase: T,
    issued: bool,
    // Set when the counter was moved back after IDs were issued
    force_advance: bool,
}

impl QuickId {
    /// Create a generator with its own `Timebase` on the system clock
    pub fn new(system_tag: impl Into<String>) -> Self {
        Self::with_timebase(Timebase::new(), system_tag)
    }
}

impl<C: Clock> QuickId<SharedTimebase<C>> {
    /// Create a generator on a timebase shared with other generators.
    ///
    /// IDs from all generators on the same timebase are time-ordered with
    /// respect to each other.
    pub fn with_shared_timebase(timebase: &SharedTimebase<C>, system_tag: impl Into<String>) -> Self {
        Self::with_timebase(timebase.clone(), system_tag)
    }
}

impl<T: TimestampSource> QuickId<T> {
    pub fn with_timebase(timebase: T, system_tag: impl Into<String>) -> Self {
        Self {
            system_tag: system_tag.into(),
            sequence: 0,
            timebase,
            issued: false,
            force_advance: false,
        }
    }

    /// Resume the counter at `sequence`; the next ID uses `sequence + 1`.
    ///
    /// On a generator that has already issued IDs, a value at or below the
    /// current counter makes the next ID wait for a later millisecond, so it
    /// cannot repeat one handed out before.
    pub fn with_initial_sequence(mut self, sequence: u32) -> Result<Self> {
        if sequence >= SEQ_LIMIT {
            return Err(QuickIdError::SequenceOutOfRange(sequence));
        }
        if self.issued && sequence <= self.sequence {
            self.force_advance = true;
        }
        self.sequence = sequence;
        Ok(self)
    }

    /// Produce the next ID
    pub fn get_id(&mut self) -> String {
        self.sequence += 1;
        self.issued = true;

        let wrapped = self.sequence == SEQ_LIMIT;
        if wrapped {
            self.sequence = 0;
        }

        let time = if wrapped || std::mem::take(&mut self.force_advance) {
            let time = self.timebase.advance_past_last();
            debug!(system_tag = %self.system_tag, time, wrapped, "Sequence moved back, advanced timebase");
            time
        } else {
            self.timebase.newer_timestamp(0)
        };

        format_id(time, &self.system_tag, self.sequence)
    }

    /// Split an ID into its components. Parsing is structural, so IDs from
    /// any generator are accepted.
    pub fn parse_id(&self, id: &str) -> Result<ParsedId> {
        parse_id(id)
    }

    pub fn system_tag(&self) -> &str {
        &self.system_tag
    }

    /// Sequence value used by the most recent ID
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Length in bytes of every ID this generator produces
    pub fn id_len(&self) -> usize {
        MIN_ID_LEN + self.system_tag.len()
    }

    pub fn timebase(&self) -> &T {
        &self.timebase
    }
}

impl<T: TimestampSource> Iterator for QuickId<T> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.get_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickid_util::{now_millis, ManualClock, WaitStrategy};
    use std::thread;
    use std::time::Duration;

    fn manual_generator(tag: &str, start: i64) -> (QuickId<Timebase<ManualClock>>, ManualClock) {
        let clock = ManualClock::new(start);
        let timebase = Timebase::with_clock(clock.clone())
            .with_wait_strategy(WaitStrategy::sleep(Duration::from_micros(100)));
        (QuickId::with_timebase(timebase, tag), clock)
    }

    #[test]
    fn first_id_uses_sequence_one() {
        let (mut ids, _clock) = manual_generator("-foo-", 1);
        assert_eq!(ids.get_id(), "000000001-foo-0001");
        assert_eq!(ids.get_id(), "000000001-foo-0002");
        assert_eq!(ids.sequence(), 2);
    }

    #[test]
    fn sequence_keeps_rolling_across_milliseconds() {
        let (mut ids, clock) = manual_generator("t", 1_000);
        let a = parse_id(&ids.get_id()).unwrap();
        clock.advance(1);
        let b = parse_id(&ids.get_id()).unwrap();

        assert_eq!((a.time, a.seq), (1_000, 1));
        assert_eq!((b.time, b.seq), (1_001, 2));
    }

    #[test]
    fn ids_have_fixed_width() {
        for tag in ["", "a", "-node-17-", "été"] {
            let mut ids = QuickId::new(tag);
            for _ in 0..50 {
                let id = ids.get_id();
                assert_eq!(id.len(), 9 + tag.len() + 4);
                assert_eq!(id.len(), ids.id_len());
            }
        }
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let mut ids = QuickId::new("-x-");
        let mut prev = ids.get_id();
        for _ in 0..10_000 {
            let next = ids.get_id();
            assert!(next > prev, "ID not increasing: {} >= {}", prev, next);
            prev = next;
        }
    }

    #[test]
    fn ids_increase_while_clock_goes_backwards() {
        let (mut ids, clock) = manual_generator("t", 50_000);
        let first = ids.get_id();
        clock.set(40_000);
        let second = ids.get_id();

        assert!(second > first);
        assert_eq!(ids.parse_id(&second).unwrap().time, 50_000);
    }

    #[test]
    fn round_trip_recovers_components() {
        let mut ids = QuickId::new("-host-");
        let before = now_millis();
        let id = ids.get_id();
        let after = now_millis();

        let parsed = ids.parse_id(&id).unwrap();
        assert_eq!(parsed.sys, "-host-");
        assert_eq!(parsed.seq, ids.sequence());
        assert!(parsed.time >= before && parsed.time <= after);
        assert_eq!(parsed.encode(), id);
    }

    #[test]
    fn rollover_resets_sequence_and_advances_time() {
        let mut ids = QuickId::new("-r-").with_initial_sequence(SEQ_LIMIT - 2).unwrap();

        let last = parse_id(&ids.get_id()).unwrap();
        assert_eq!(last.seq, SEQ_LIMIT - 1);

        let wrapped = parse_id(&ids.get_id()).unwrap();
        assert_eq!(wrapped.seq, 0);
        assert!(wrapped.time > last.time);
    }

    #[test]
    fn rollover_waits_for_stalled_clock() {
        let (ids, clock) = manual_generator("t", 7_000);
        let mut ids = ids.with_initial_sequence(SEQ_LIMIT - 1).unwrap();
        ids.timebase.get_newer_timestamp(0);

        let driver = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            clock.advance(1);
        });

        let id = ids.get_id();
        driver.join().unwrap();

        let parsed = ids.parse_id(&id).unwrap();
        assert_eq!((parsed.time, parsed.seq), (7_001, 0));
    }

    #[test]
    fn initial_sequence_out_of_range() {
        let err = QuickId::new("t").with_initial_sequence(SEQ_LIMIT).unwrap_err();
        assert_eq!(err, QuickIdError::SequenceOutOfRange(SEQ_LIMIT));
    }

    #[test]
    fn resuming_lower_sequence_after_use_waits_for_next_millisecond() {
        let (mut ids, clock) = manual_generator("-p-", 5_000);
        let first = ids.get_id();
        assert_eq!(first, "0000004s8-p-0001");

        let mut ids = ids.with_initial_sequence(0).unwrap();
        let driver = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            clock.advance(1);
        });

        let second = ids.get_id();
        driver.join().unwrap();

        assert!(second > first, "ID not increasing: {} >= {}", first, second);
        let parsed = parse_id(&second).unwrap();
        assert_eq!((parsed.time, parsed.seq), (5_001, 1));
    }

    #[test]
    fn resuming_higher_sequence_after_use_keeps_millisecond() {
        let (mut ids, _clock) = manual_generator("-p-", 5_000);
        ids.get_id();

        let mut ids = ids.with_initial_sequence(100).unwrap();
        let parsed = parse_id(&ids.get_id()).unwrap();
        assert_eq!((parsed.time, parsed.seq), (5_000, 101));
    }

    #[test]
    fn shared_timebase_orders_across_generators() {
        let shared = SharedTimebase::new();
        let mut a = QuickId::with_shared_timebase(&shared, "-a-");
        let mut b = QuickId::with_shared_timebase(&shared, "-b-");

        let mut times = Vec::new();
        for _ in 0..1_000 {
            times.push(parse_id(&a.get_id()).unwrap().time);
            times.push(parse_id(&b.get_id()).unwrap().time);
        }
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn iterator_yields_ids() {
        let ids: Vec<String> = QuickId::new("-it-").take(3).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    }
}
