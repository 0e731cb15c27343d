// Deployment query time-window resolution
//
// Turns the optional time parameters of a `get_deployments` call into a
// concrete `[from_timestamp, to_timestamp)` window of Unix seconds (UTC).
// Pure: the current time is captured once by the caller and passed in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{ArgoError, Result};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Look-back used by the timestamp/day-count call shape.
pub const DEFAULT_DAYS_HISTORY: i64 = 30;

/// Look-back used by the delta/datetime-string call shape.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 1;

static TIME_DELTA_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)([mhd])$").ok());

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Unit suffix of a relative time delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => SECONDS_PER_DAY,
        }
    }
}

/// How the caller described the time window.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSpec {
    /// Both raw bounds supplied; used verbatim.
    Explicit { from: i64, to: i64 },
    /// Parsed ISO-8601 bounds; a missing end means "now".
    AbsoluteRange {
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    },
    /// `value` units back from now.
    RelativeDelta { value: i64, unit: TimeUnit },
    /// `days` back from `to` (or now), unless `from` is pinned.
    DayCount {
        days: i64,
        from: Option<i64>,
        to: Option<i64>,
    },
}

/// Resolved request window passed to the deployment client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryWindow {
    pub from_timestamp: i64,
    pub to_timestamp: i64,
    pub app: Option<String>,
}

impl TimeSpec {
    /// Timestamp/day-count call shape.
    pub fn from_timestamps(
        days_history: Option<i64>,
        from_timestamp: Option<i64>,
        to_timestamp: Option<i64>,
    ) -> Self {
        match (from_timestamp, to_timestamp) {
            (Some(from), Some(to)) => Self::Explicit { from, to },
            (from, to) => Self::DayCount {
                days: days_history.unwrap_or(DEFAULT_DAYS_HISTORY),
                from,
                to,
            },
        }
    }

    /// Delta/datetime-string call shape. Absolute datetimes beat a delta.
    pub fn from_strings(
        time_delta: Option<&str>,
        from_datetime: Option<&str>,
        to_datetime: Option<&str>,
    ) -> Result<Self> {
        if let Some(from) = from_datetime {
            let from = parse_iso_datetime(from)?;
            let to = to_datetime.map(parse_iso_datetime).transpose()?;
            return Ok(Self::AbsoluteRange { from, to });
        }

        if let Some(delta) = time_delta {
            let (value, unit) = parse_time_delta(delta)?;
            return Ok(Self::RelativeDelta { value, unit });
        }

        Ok(Self::DayCount {
            days: DEFAULT_LOOKBACK_DAYS,
            from: None,
            to: None,
        })
    }

    /// Compute `(from_timestamp, to_timestamp)` relative to `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> (i64, i64) {
        let now_ts = now.timestamp();

        match *self {
            Self::Explicit { from, to } => (from, to),
            Self::AbsoluteRange { from, to } => {
                (from.timestamp(), to.map_or(now_ts, |t| t.timestamp()))
            }
            Self::RelativeDelta { value, unit } => {
                (now_ts.saturating_sub(value.saturating_mul(unit.seconds())), now_ts)
            }
            Self::DayCount { days, from, to } => {
                let to = to.unwrap_or(now_ts);
                let from =
                    from.unwrap_or_else(|| to.saturating_sub(days.saturating_mul(SECONDS_PER_DAY)));
                (from, to)
            }
        }
    }
}

/// Union of both parameter shapes accepted by `get_deployments`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeploymentQuery {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub time_delta: Option<String>,
    #[serde(default)]
    pub from_datetime: Option<String>,
    #[serde(default)]
    pub to_datetime: Option<String>,
    #[serde(default)]
    pub days_history: Option<i64>,
    #[serde(default)]
    pub from_timestamp: Option<i64>,
    #[serde(default)]
    pub to_timestamp: Option<i64>,
}

impl DeploymentQuery {
    fn uses_timestamp_shape(&self) -> bool {
        self.days_history.is_some() || self.from_timestamp.is_some() || self.to_timestamp.is_some()
    }

    /// Pick the time window shape by precedence: raw timestamp pair,
    /// absolute datetimes, relative delta, then the day-count default of
    /// whichever call shape the caller used.
    pub fn time_spec(&self) -> Result<TimeSpec> {
        match (self.from_timestamp, self.to_timestamp) {
            (Some(from), Some(to)) => Ok(TimeSpec::Explicit { from, to }),
            _ if self.from_datetime.is_some() || self.time_delta.is_some() => {
                TimeSpec::from_strings(
                    self.time_delta.as_deref(),
                    self.from_datetime.as_deref(),
                    self.to_datetime.as_deref(),
                )
            }
            _ if self.uses_timestamp_shape() => Ok(TimeSpec::from_timestamps(
                self.days_history,
                self.from_timestamp,
                self.to_timestamp,
            )),
            _ => TimeSpec::from_strings(None, None, None),
        }
    }

    /// Resolve into a concrete window against a single captured `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<QueryWindow> {
        let spec = self.time_spec()?;
        Ok(resolve_window(&spec, self.app.clone(), now))
    }
}

pub fn resolve_window(spec: &TimeSpec, app: Option<String>, now: DateTime<Utc>) -> QueryWindow {
    let (from_timestamp, to_timestamp) = spec.resolve(now);
    QueryWindow {
        from_timestamp,
        to_timestamp,
        app,
    }
}

/// Parse `<digits><m|h|d>` (case-insensitive) into a value and unit.
pub fn parse_time_delta(input: &str) -> Result<(i64, TimeUnit)> {
    let invalid = || {
        ArgoError::InvalidInput(format!(
            "Invalid time_delta format: '{}'. Use a number followed by 'm', 'h', or 'd' (e.g. '2h').",
            input
        ))
    };

    let pattern = TIME_DELTA_PATTERN
        .as_ref()
        .ok_or_else(|| ArgoError::InvalidInput("time_delta pattern unavailable".into()))?;
    let caps = pattern.captures(input).ok_or_else(invalid)?;

    let value: i64 = caps[1].parse().map_err(|_| invalid())?;
    let unit = match caps[2].to_ascii_lowercase().as_str() {
        "m" => TimeUnit::Minutes,
        "h" => TimeUnit::Hours,
        "d" => TimeUnit::Days,
        _ => return Err(invalid()),
    };

    // Reject deltas that cannot be expressed in seconds.
    value.checked_mul(unit.seconds()).ok_or_else(invalid)?;

    Ok((value, unit))
}

/// Parse an ISO-8601 datetime. Offset-less values are taken as UTC;
/// zoned values are converted to UTC.
pub fn parse_iso_datetime(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    let normalized = match trimmed.strip_suffix(&['Z', 'z'][..]) {
        Some(rest) => format!("{}+00:00", rest),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(ArgoError::InvalidInput(format!(
        "Invalid ISO 8601 datetime: '{}'",
        input
    )))
}
