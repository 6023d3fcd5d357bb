use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::models::{TimeEntry, TimeEntryInput};
use crate::time_helpers::{calculate_duration, combine, local_date_string, local_time_string};

/// Create/edit dialog contents, dates and times as typed in local time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryForm {
    #[serde(default)]
    pub task_id: Option<u64>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub end_time: String,
}

impl EntryForm {
    // Fresh dialog: the hour that just ended
    pub fn blank(now: NaiveDateTime) -> Self {
        let start = now - TimeDelta::hours(1);
        Self {
            task_id: None,
            comment: String::new(),
            start_date: local_date_string(start),
            start_time: local_time_string(start),
            end_date: local_date_string(now),
            end_time: local_time_string(now),
        }
    }

    // Edit dialog prefilled from an existing entry
    pub fn from_entry<Tz: TimeZone>(entry: &TimeEntry, tz: &Tz) -> Self {
        let start = entry.start.with_timezone(tz).naive_local();
        let end = entry.end.with_timezone(tz).naive_local();
        Self {
            task_id: Some(entry.task_id),
            comment: entry.comment.clone(),
            start_date: local_date_string(start),
            start_time: local_time_string(start),
            end_date: local_date_string(end),
            end_time: local_time_string(end),
        }
    }

    pub fn duration(&self) -> String {
        calculate_duration(&self.start_date, &self.start_time, &self.end_date, &self.end_time)
    }

    /// Validates against the machine's local time zone and clock.
    pub fn validate(&self) -> Result<TimeEntryInput, FormError> {
        self.validate_in(&Local, Local::now())
    }

    pub fn validate_in<Tz: TimeZone>(&self, tz: &Tz, now: DateTime<Tz>) -> Result<TimeEntryInput, FormError> {
        let task_id = self
            .task_id
            .filter(|id| *id >= 1)
            .ok_or(FormError::MissingTaskId)?;
        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(FormError::MissingComment);
        }

        for (value, field) in [
            (&self.start_date, "Start date"),
            (&self.start_time, "Start time"),
            (&self.end_date, "End date"),
            (&self.end_time, "End time"),
        ] {
            if value.trim().is_empty() {
                return Err(FormError::MissingField(field));
            }
        }

        let start = instant(tz, &self.start_date, &self.start_time, "Start")?;
        let end = instant(tz, &self.end_date, &self.end_time, "End")?;
        if end <= start {
            return Err(FormError::EndBeforeStart);
        }
        if end > now.with_timezone(&Utc) {
            return Err(FormError::EndInFuture);
        }

        Ok(TimeEntryInput {
            task_id,
            comment: comment.to_string(),
            start,
            end,
        })
    }
}

fn instant<Tz: TimeZone>(tz: &Tz, date: &str, time: &str, field: &'static str) -> Result<DateTime<Utc>, FormError> {
    let unparsable = || FormError::Unparsable {
        field,
        value: format!("{date} {time}"),
    };
    let naive = combine(date, time).ok_or_else(unparsable)?;
    // a wall time skipped by a DST jump has no instant
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(unparsable)
}
