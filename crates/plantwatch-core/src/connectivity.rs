//! Online/offline judgment from reading recency.
//!
//! A sensor is online when its latest reading is younger than its configured
//! sampling interval plus a fixed grace period. There is no heartbeat; the
//! reading timestamps are the only signal.

use time::{Duration, OffsetDateTime};

use plantwatch_types::{Reading, Sensor};

/// Slack added to every sensor's sampling interval.
pub const GRACE_PERIOD_SECS: i64 = 60;

/// Maximum reading age at which a sensor with `interval_secs` is still online.
#[must_use]
pub fn tolerance(interval_secs: u32) -> Duration {
    Duration::seconds(i64::from(interval_secs) + GRACE_PERIOD_SECS)
}

/// Whether a sensor whose latest reading was taken at `last_reading` is online at `now`.
///
/// Returns `false` when there is no reading. The comparison is strict: a
/// reading exactly `tolerance` old is offline.
#[must_use]
pub fn is_online(
    last_reading: Option<OffsetDateTime>,
    interval_secs: u32,
    now: OffsetDateTime,
) -> bool {
    match last_reading {
        Some(at) => now - at < tolerance(interval_secs),
        None => false,
    }
}

/// Convenience wrapper over [`is_online`] for a sensor and its latest reading.
#[must_use]
pub fn sensor_is_online(sensor: &Sensor, last_reading: Option<&Reading>, now: OffsetDateTime) -> bool {
    is_online(
        last_reading.map(|r| r.created_at),
        sensor.reading_interval_secs,
        now,
    )
}
