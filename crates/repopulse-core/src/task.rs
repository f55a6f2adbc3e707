use crate::{Error, Result, TrackedRepository};
use chrono::{DateTime, FixedOffset, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Delivery time used when a recurring task does not name one
pub const DEFAULT_EXECUTE_TIME: &str = "09:00";

/// Recurrence pattern of a notification task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fire once, as soon as armed
    Immediate,
    Daily,
    Weekly(Weekday),
    /// Day of month, 1..=31; clamped to the last day in shorter months
    Monthly(u32),
}

impl Cadence {
    /// Build a cadence from the wire fields (`frequency`, `weekday`, `monthDay`)
    pub fn parse(frequency: &str, weekday: Option<&str>, month_day: Option<&str>) -> Result<Self> {
        match frequency.trim().to_lowercase().as_str() {
            "immediate" => Ok(Cadence::Immediate),
            "daily" => Ok(Cadence::Daily),
            "weekly" => {
                let raw = weekday
                    .ok_or_else(|| Error::InvalidTask("weekly task needs a weekday".to_string()))?;
                Ok(Cadence::Weekly(parse_weekday(raw)?))
            }
            "monthly" => {
                let raw = month_day
                    .ok_or_else(|| Error::InvalidTask("monthly task needs a monthDay".to_string()))?;
                let day: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidTask(format!("invalid monthDay: {}", raw)))?;
                if !(1..=31).contains(&day) {
                    return Err(Error::InvalidTask(format!("monthDay out of range: {}", day)));
                }
                Ok(Cadence::Monthly(day))
            }
            other => Err(Error::InvalidTask(format!("unknown frequency: {}", other))),
        }
    }

    pub fn frequency(&self) -> &'static str {
        match self {
            Cadence::Immediate => "immediate",
            Cadence::Daily => "daily",
            Cadence::Weekly(_) => "weekly",
            Cadence::Monthly(_) => "monthly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Cadence::Immediate)
    }

    /// Days of activity a digest covers: one period of the cadence, so
    /// consecutive firings neither skip nor repeat a window.
    /// Immediate tasks use `default_days`.
    pub fn lookback_days(&self, default_days: u32) -> u32 {
        match self {
            Cadence::Immediate => default_days,
            Cadence::Daily => 1,
            Cadence::Weekly(_) => 7,
            Cadence::Monthly(_) => 31,
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cadence::Immediate => write!(f, "immediate"),
            Cadence::Daily => write!(f, "daily"),
            Cadence::Weekly(day) => write!(f, "weekly on {}", day),
            Cadence::Monthly(day) => write!(f, "monthly on day {}", day),
        }
    }
}

/// Accepts cron-style numbers (0 and 7 are Sunday, 1 is Monday) or English names
fn parse_weekday(raw: &str) -> Result<Weekday> {
    let value = raw.trim().to_lowercase();
    let weekday = match value.as_str() {
        "0" | "7" | "sun" | "sunday" => Weekday::Sun,
        "1" | "mon" | "monday" => Weekday::Mon,
        "2" | "tue" | "tuesday" => Weekday::Tue,
        "3" | "wed" | "wednesday" => Weekday::Wed,
        "4" | "thu" | "thursday" => Weekday::Thu,
        "5" | "fri" | "friday" => Weekday::Fri,
        "6" | "sat" | "saturday" => Weekday::Sat,
        _ => return Err(Error::InvalidTask(format!("invalid weekday: {}", raw))),
    };
    Ok(weekday)
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let value = raw.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| Error::InvalidTask(format!("invalid executeTime: {}", raw)))
}

/// Create/update payload for a notification task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub email: String,
    pub repositories: Vec<String>,
    pub frequency: String,
    #[serde(default)]
    pub weekday: Option<String>,
    #[serde(default, rename = "monthDay")]
    pub month_day: Option<String>,
    #[serde(default, rename = "executeTime")]
    pub execute_time: Option<String>,
}

/// A subscriber's digest subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct NotificationTask {
    pub id: String,
    pub recipient: String,
    pub repositories: BTreeSet<String>,
    pub cadence: Cadence,
    /// Wall-clock time in the reference zone
    pub time_of_day: NaiveTime,
    pub created_at: DateTime<FixedOffset>,
}

impl NotificationTask {
    pub fn from_request(request: TaskRequest, created_at: DateTime<FixedOffset>) -> Result<Self> {
        let (recipient, repositories, cadence, time_of_day) = validate_request(&request)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            recipient,
            repositories,
            cadence,
            time_of_day,
            created_at,
        })
    }

    /// Replace everything but the identity and creation time
    pub fn apply(&mut self, request: TaskRequest) -> Result<()> {
        let (recipient, repositories, cadence, time_of_day) = validate_request(&request)?;
        self.recipient = recipient;
        self.repositories = repositories;
        self.cadence = cadence;
        self.time_of_day = time_of_day;
        Ok(())
    }
}

fn validate_request(
    request: &TaskRequest,
) -> Result<(String, BTreeSet<String>, Cadence, NaiveTime)> {
    let recipient = request.email.trim().to_string();
    if !is_plausible_email(&recipient) {
        return Err(Error::InvalidTask(format!("invalid email: {}", request.email)));
    }

    let repositories = request
        .repositories
        .iter()
        .map(|raw| TrackedRepository::parse(raw).map(|repo| repo.full_name))
        .collect::<Result<BTreeSet<_>>>()
        .map_err(|e| Error::InvalidTask(e.to_string()))?;
    if repositories.is_empty() {
        return Err(Error::InvalidTask("at least one repository is required".to_string()));
    }

    let cadence = Cadence::parse(
        &request.frequency,
        request.weekday.as_deref(),
        request.month_day.as_deref(),
    )?;

    let time_of_day =
        parse_time_of_day(request.execute_time.as_deref().unwrap_or(DEFAULT_EXECUTE_TIME))?;

    Ok((recipient, repositories, cadence, time_of_day))
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// On-disk / wire shape of a notification task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub email: String,
    pub repositories: Vec<String>,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    #[serde(default, rename = "monthDay", skip_serializing_if = "Option::is_none")]
    pub month_day: Option<String>,
    #[serde(default, rename = "executeTime", skip_serializing_if = "Option::is_none")]
    pub execute_time: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<NotificationTask> for TaskRecord {
    fn from(task: NotificationTask) -> Self {
        let (weekday, month_day) = match task.cadence {
            Cadence::Weekly(day) => (Some(day.number_from_monday().to_string()), None),
            Cadence::Monthly(day) => (None, Some(day.to_string())),
            Cadence::Immediate | Cadence::Daily => (None, None),
        };

        Self {
            id: task.id,
            email: task.recipient,
            repositories: task.repositories.into_iter().collect(),
            frequency: task.cadence.frequency().to_string(),
            weekday,
            month_day,
            execute_time: Some(task.time_of_day.format("%H:%M").to_string()),
            created_at: task.created_at,
        }
    }
}

impl TryFrom<TaskRecord> for NotificationTask {
    type Error = Error;

    fn try_from(record: TaskRecord) -> Result<Self> {
        let request = TaskRequest {
            email: record.email,
            repositories: record.repositories,
            frequency: record.frequency,
            weekday: record.weekday,
            month_day: record.month_day,
            execute_time: record.execute_time,
        };
        let (recipient, repositories, cadence, time_of_day) = validate_request(&request)?;

        Ok(Self {
            id: record.id,
            recipient,
            repositories,
            cadence,
            time_of_day,
            created_at: record.created_at,
        })
    }
}
