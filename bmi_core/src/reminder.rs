//! Periodic measurement reminder.
//!
//! A single schedule is persisted next to the records. Scheduling again
//! replaces the existing schedule and restarts the interval, so there is
//! never more than one pending reminder.

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Longest accepted interval between reminders (ten years)
pub const MAX_INTERVAL_DAYS: u32 = 3650;

pub const REMINDER_TITLE: &str = "Time to check your BMI!";
pub const REMINDER_BODY: &str =
    "It's been a while since your last measurement. Update your weight today.";

/// Persisted reminder schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReminderSchedule {
    pub interval_days: u32,
    pub next_due_at: DateTime<Utc>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// A reminder that is due now
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ReminderNotice {
    pub title: &'static str,
    pub body: &'static str,
    pub due_at: DateTime<Utc>,
}

impl ReminderSchedule {
    fn interval(&self) -> Duration {
        Duration::days(i64::from(self.interval_days))
    }

    /// `from` plus one interval, or a config error if the date overflows
    fn advance(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        from.checked_add_signed(self.interval()).ok_or_else(|| {
            Error::Config(format!(
                "reminder interval of {} days overflows the calendar",
                self.interval_days
            ))
        })
    }

    /// Reject intervals no calendar could schedule
    pub fn validate_interval(interval_days: u32) -> Result<()> {
        if interval_days == 0 {
            return Err(Error::Config("reminder interval must be at least one day".into()));
        }
        if interval_days > MAX_INTERVAL_DAYS {
            return Err(Error::Config(format!(
                "reminder interval must be at most {} days, got {}",
                MAX_INTERVAL_DAYS, interval_days
            )));
        }
        Ok(())
    }

    /// Create or replace the schedule; the first reminder fires one
    /// interval from `now`.
    pub fn schedule(path: &Path, now: DateTime<Utc>, interval_days: u32) -> Result<Self> {
        Self::validate_interval(interval_days)?;
        let mut schedule = Self {
            interval_days,
            next_due_at: now,
            last_notified_at: None,
        };
        schedule.next_due_at = schedule.advance(now)?;
        schedule.save(path)?;
        tracing::info!(
            "Scheduled reminder every {} days, next at {}",
            interval_days,
            schedule.next_due_at
        );
        Ok(schedule)
    }

    /// Return a notice if the reminder is due, advancing the schedule past
    /// `now`. Missed periods collapse into one notice.
    pub fn check(path: &Path, now: DateTime<Utc>) -> Result<Option<ReminderNotice>> {
        let Some(mut schedule) = Self::load(path)? else {
            return Ok(None);
        };
        if now < schedule.next_due_at {
            return Ok(None);
        }

        let due_at = schedule.next_due_at;
        Self::validate_interval(schedule.interval_days)?;
        while schedule.next_due_at <= now {
            schedule.next_due_at = schedule.advance(schedule.next_due_at)?;
        }
        schedule.last_notified_at = Some(now);
        schedule.save(path)?;

        tracing::info!("Reminder due (was due at {}), next at {}", due_at, schedule.next_due_at);
        Ok(Some(ReminderNotice {
            title: REMINDER_TITLE,
            body: REMINDER_BODY,
            due_at,
        }))
    }

    /// Remove the schedule. Returns whether one existed.
    pub fn cancel(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        tracing::info!("Cancelled reminder");
        Ok(true)
    }

    /// Load the schedule with shared locking
    ///
    /// Returns `None` if no reminder is scheduled. A corrupted file is
    /// logged and treated as no schedule.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!("No reminder file at {:?}", path);
            return Ok(None);
        }

        let file = File::open(path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<ReminderSchedule>(&contents) {
            Ok(schedule) => Ok(Some(schedule)),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse reminder file {:?}: {}. Ignoring it.",
                    path,
                    e
                );
                Ok(None)
            }
        }
    }

    /// Save the schedule with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other(format!("reminder path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old schedule
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved reminder schedule to {:?}", path);
        Ok(())
    }
}
