//! Time utilities for quickid
//!
//! Provides the wall-clock abstraction every `Timebase` reads from, plus the
//! strategies used while waiting for that clock to reach a requested instant.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `QUICKID_MOCK_TIME` environment variable can be set
//! to shift the system clock for every `SystemClock` reading. This is useful
//! for inspecting IDs minted "in the future" or "in the past".
//!
//! Format: `YYYY-MM-DD HH:MM:SS`, interpreted as UTC (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! QUICKID_MOCK_TIME="2025-12-25 14:30:00" quickid generate -t node-a
//! ```

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "QUICKID_MOCK_TIME";

/// Format accepted by `QUICKID_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached mock time offset (milliseconds) from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<i64>> = OnceLock::new();

/// Parse a mock time string into milliseconds since the Unix epoch.
pub fn parse_mock_time(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value, MOCK_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn get_mock_time_offset() -> Option<i64> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_mock_time(&mock_time_str) {
                    Some(mock_ms) => {
                        let offset = mock_ms - real_millis();
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_ms = offset,
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Real wall clock in milliseconds; a pre-epoch reading is clamped to 0.
fn real_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Apply a mock time offset to a real reading, clamping at the epoch.
fn shifted(real: i64, offset: Option<i64>) -> i64 {
    match offset {
        Some(offset) => (real + offset).max(0),
        None => real,
    }
}

/// Source of wall-clock readings in milliseconds since the Unix epoch.
///
/// The reading may stall or move backwards; callers that need a monotonic
/// value go through a `Timebase`.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// The process wall clock, shifted by `QUICKID_MOCK_TIME` in debug builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shifted(real_millis(), get_mock_time_offset())
    }
}

/// Current wall-clock reading of the `SystemClock`.
pub fn now_millis() -> i64 {
    SystemClock.now_millis()
}

/// A hand-driven clock for tests. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self(Arc::new(AtomicI64::new(millis)))
    }

    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }

    /// Move the clock by `delta` milliseconds (negative values move it back)
    pub fn advance(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a `Timebase` backs off between clock reads while waiting for a
/// requested instant. Every strategy re-reads the clock after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Busy-poll with a CPU spin hint
    #[default]
    Spin,
    /// Yield the thread to the OS scheduler between reads
    Yield,
    /// Sleep for a short interval between reads
    Sleep { interval_micros: u64 },
}

impl WaitStrategy {
    pub fn sleep(interval: Duration) -> Self {
        Self::Sleep {
            interval_micros: interval.as_micros() as u64,
        }
    }

    /// Perform one back-off step
    pub fn pause(&self) {
        match self {
            WaitStrategy::Spin => std::hint::spin_loop(),
            WaitStrategy::Yield => std::thread::yield_now(),
            WaitStrategy::Sleep { interval_micros } => {
                std::thread::sleep(Duration::from_micros(*interval_micros))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WaitStrategy::Spin => "spin",
            WaitStrategy::Yield => "yield",
            WaitStrategy::Sleep { .. } => "sleep",
        }
    }
}

/// Milliseconds since the epoch as a UTC datetime, if representable.
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Format milliseconds since the epoch as RFC 3339 with millisecond precision.
pub fn format_millis(millis: i64) -> String {
    match millis_to_datetime(millis) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => format!("{}ms", millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_now_millis_is_reasonable() {
        let dt = millis_to_datetime(now_millis()).unwrap();
        assert!(dt.year() >= 2020);
        assert!(dt.year() <= 2100);
    }

    #[test]
    fn test_now_consistency() {
        let t1 = now_millis();
        std::thread::sleep(Duration::from_millis(50));
        let t2 = now_millis();

        let diff = t2 - t1;
        assert!(
            (40..=200).contains(&diff),
            "Expected ~50ms difference, got {}ms",
            diff
        );
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();

        clock.advance(5);
        assert_eq!(other.now_millis(), 1_005);

        other.set(10);
        assert_eq!(clock.now_millis(), 10);

        clock.advance(-3);
        assert_eq!(other.now_millis(), 7);
    }

    #[test]
    fn test_clock_through_arc() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(42));
        assert_eq!(clock.now_millis(), 42);
    }

    #[test]
    fn test_mock_time_env_var_name() {
        assert_eq!(MOCK_TIME_ENV_VAR, "QUICKID_MOCK_TIME");
    }

    #[test]
    fn test_parse_mock_time_format() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 25, 14, 30, 0).unwrap();
        assert_eq!(
            parse_mock_time("2025-12-25 14:30:00"),
            Some(expected.timestamp_millis())
        );
        assert_eq!(parse_mock_time("1970-01-01 00:00:00"), Some(0));
    }

    #[test]
    fn test_parse_mock_time_invalid_formats() {
        let invalid_formats = [
            "2025-12-25",          // Missing time
            "14:30:00",            // Missing date
            "2025/12/25 14:30:00", // Wrong date separator
            "2025-12-25T14:30:00", // ISO format (not supported)
            "25-12-2025 14:30:00", // Wrong date order
            "",
            "not a date",
        ];

        for format_str in &invalid_formats {
            assert!(
                parse_mock_time(format_str).is_none(),
                "Expected '{}' to fail parsing",
                format_str
            );
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_is_mock_time_active_in_debug() {
        // OnceLock caches the first lookup, so only check that it does not panic
        let _ = is_mock_time_active();
    }

    #[test]
    fn test_shifted_without_offset_is_real_time() {
        assert_eq!(shifted(1_000, None), 1_000);
        assert_eq!(shifted(0, None), 0);
    }

    #[test]
    fn test_shifted_applies_offset() {
        assert_eq!(shifted(1_000, Some(500)), 1_500);
        assert_eq!(shifted(1_000, Some(-400)), 600);
    }

    #[test]
    fn test_shifted_clamps_before_epoch() {
        assert_eq!(shifted(100, Some(-1_000)), 0);
        assert_eq!(shifted(100, Some(-100)), 0);
    }

    #[test]
    fn test_mock_time_offset_calculation() {
        let mock_ms = parse_mock_time("2025-12-25 14:30:00").unwrap();
        let real_now = real_millis();
        let offset = mock_ms - real_now;

        assert_eq!(shifted(real_now, Some(offset)), mock_ms);
        assert_eq!(format_millis(shifted(real_now, Some(offset))), "2025-12-25T14:30:00.000Z");
    }

    #[test]
    fn test_mock_time_advances_with_real_time() {
        let mock_ms = parse_mock_time("2025-12-25 14:30:00").unwrap();
        let real_start = real_millis();
        let offset = Some(mock_ms - real_start);

        std::thread::sleep(Duration::from_millis(100));
        let real_end = real_millis();

        let mock_elapsed = shifted(real_end, offset) - shifted(real_start, offset);
        assert_eq!(mock_elapsed, real_end - real_start);
        assert!(mock_elapsed >= 100, "Expected at least 100ms, got {}ms", mock_elapsed);
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_millis(1_766_673_000_123), "2025-12-25T14:30:00.123Z");
    }

    #[test]
    fn test_wait_strategy_default_is_spin() {
        assert_eq!(WaitStrategy::default(), WaitStrategy::Spin);
        assert_eq!(WaitStrategy::default().name(), "spin");
    }

    #[test]
    fn test_wait_strategy_sleep_constructor() {
        let strategy = WaitStrategy::sleep(Duration::from_micros(250));
        assert_eq!(strategy, WaitStrategy::Sleep { interval_micros: 250 });
        assert_eq!(strategy.name(), "sleep");
    }

    #[test]
    fn test_wait_strategy_pause_returns() {
        for strategy in [
            WaitStrategy::Spin,
            WaitStrategy::Yield,
            WaitStrategy::Sleep { interval_micros: 1 },
        ] {
            strategy.pause();
        }
    }

    #[test]
    fn test_wait_strategy_serde() {
        let json = serde_json::to_string(&WaitStrategy::Sleep { interval_micros: 100 }).unwrap();
        assert_eq!(json, r#"{"type":"sleep","interval_micros":100}"#);

        let parsed: WaitStrategy = serde_json::from_str(r#"{"type":"yield"}"#).unwrap();
        assert_eq!(parsed, WaitStrategy::Yield);
    }
}
