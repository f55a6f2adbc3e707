use crate::{Error, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

/// UTC+8, the zone the tracked data has always been recorded in.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Formats accepted for timestamps that carry no zone information.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Resolves lookback windows against a fixed reference zone.
///
/// Every instant handed out by this type is zone-aware, so comparisons
/// between API data, snapshot files and cutoffs never mix naive and aware
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    zone: FixedOffset,
}

impl TimeWindow {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    pub fn from_offset_hours(hours: i32) -> Result<Self> {
        FixedOffset::east_opt(hours * 3600)
            .map(Self::new)
            .ok_or_else(|| Error::InvalidWindow(format!("UTC offset out of range: {}h", hours)))
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// Current time in the reference zone
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.zone)
    }

    /// `now - days`, exactly
    pub fn resolve(&self, days: u32, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        now - Duration::days(i64::from(days))
    }

    /// Cutoff for a lookback of `days` ending at the current time
    pub fn cutoff(&self, days: u32) -> DateTime<FixedOffset> {
        self.resolve(days, self.now())
    }

    /// Parse a timestamp from the hosting API or a snapshot file.
    ///
    /// Zone-less input is assigned the reference zone. Anything else that
    /// does not parse is reported as `MalformedTimestamp`; callers skip the
    /// offending record and carry on.
    pub fn parse(&self, raw: &str) -> Result<DateTime<FixedOffset>> {
        let trimmed = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt);
        }
        if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Ok(dt);
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return self.assign(naive, raw);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return self.assign(midnight, raw);
            }
        }

        Err(Error::MalformedTimestamp(raw.to_string()))
    }

    /// Express a UTC instant in the reference zone
    pub fn normalize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.zone)
    }

    fn assign(&self, naive: NaiveDateTime, raw: &str) -> Result<DateTime<FixedOffset>> {
        self.zone
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| Error::MalformedTimestamp(raw.to_string()))
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::from_offset_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or(Self { zone: Utc.fix() })
    }
}

/// Reject non-positive lookbacks before they reach the resolver
pub fn validate_days(days: i64) -> Result<u32> {
    if days <= 0 {
        return Err(Error::InvalidWindow(format!("days must be positive, got {}", days)));
    }
    u32::try_from(days).map_err(|_| Error::InvalidWindow(format!("days too large: {}", days)))
}
