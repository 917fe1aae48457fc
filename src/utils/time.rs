use std::{str::FromStr, time::Duration};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Schedules typed by organizers are in UK summer time.
const SCHEDULE_UTC_OFFSET_SECS: i32 = 3600;

/// Longest registration window accepted by `create_tournament`.
const MAX_REGISTRATION: Duration = Duration::from_secs(52 * 7 * 24 * 3600);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("`{0}` is not a valid date, expected DD,MM,YYYY,HH:MM")]
    Schedule(String),
    #[error("`{0}` is not a valid duration, expected a number followed by m, h, d or w (e.g. 90m, 2h, 1w)")]
    Duration(String),
    #[error("`{0}` is too long, registration cannot stay open for more than 52 weeks")]
    DurationTooLong(String),
}

/// An absolute date and time entered as `DD,MM,YYYY,HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub timestamp: i64,
}

impl Schedule {
    /// Discord markup that renders the schedule in each reader's own timezone.
    #[inline]
    pub fn to_discord_full(&self) -> String {
        format!("<t:{}:F>", self.timestamp)
    }
}

impl FromStr for Schedule {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeParseError::Schedule(s.to_string());

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [day, month, year, hour_minute] = parts[..] else {
            return Err(invalid());
        };
        let (hour, minute) = hour_minute.split_once(':').ok_or_else(invalid)?;

        let day: u32 = day.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
        let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;

        let datetime = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?,
            NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?,
        );
        let offset = FixedOffset::east_opt(SCHEDULE_UTC_OFFSET_SECS).ok_or_else(invalid)?;
        let datetime = datetime
            .and_local_timezone(offset)
            .single()
            .ok_or_else(invalid)?;

        Ok(Self {
            timestamp: datetime.timestamp(),
        })
    }
}

/// How long registrations stay open, written as `<digits><m|h|d|w>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationDuration(Duration);

impl RegistrationDuration {
    #[inline]
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }

    #[inline]
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for RegistrationDuration {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeParseError::Duration(s.to_string());

        let unit = s.chars().last().ok_or_else(invalid)?;
        let unit_secs: u64 = match unit {
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            'w' => 7 * 24 * 60 * 60,
            _ => return Err(invalid()),
        };

        // The unit is ASCII so slicing off the last byte is safe.
        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let too_long = || TimeParseError::DurationTooLong(s.to_string());
        let secs = digits
            .parse::<u64>()
            .map_err(|_| too_long())?
            .checked_mul(unit_secs)
            .ok_or_else(too_long)?;
        let duration = Duration::from_secs(secs);
        if duration > MAX_REGISTRATION {
            return Err(too_long());
        }

        Ok(Self(duration))
    }
}

/// Human readable remaining time, e.g. `2d 3h 15m`.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    if secs < 60 {
        return "less than a minute".to_string();
    }

    let (days, hours, minutes) = (secs / 86_400, secs % 86_400 / 3600, secs % 3600 / 60);
    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.join(" ")
}
