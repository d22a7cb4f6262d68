//! Weekly schedule evaluation.
//!
//! A class runs on a set of named weekdays between a start and end time of
//! day. This module answers the single question every scheduling-aware code
//! path has: given a wall-clock instant, where does it fall relative to the
//! class window? Listing, enroll-by-code and the live status view all call
//! [`Schedule::status_at`] so the window semantics cannot drift between them.
//!
//! All evaluation happens in the serving process's local time zone; classes
//! carry no time-zone of their own. A deployment spanning time zones would
//! need a per-class zone field first.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Where an instant falls relative to a class's weekly window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Days empty or start/end missing or unparseable. Such a class is never
    /// considered active anywhere.
    NoSchedule,
    /// Today's weekday is not in the configured set.
    WrongDay,
    /// Scheduled today, but the window has not opened yet.
    BeforeStart,
    /// Inside the window, bounds inclusive.
    InWindow,
    /// Scheduled today, window already closed.
    AfterEnd,
}

/// A parsed weekly schedule: weekday names plus `"HH:MM"` bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
}

impl Schedule {
    /// Evaluates this schedule against a local wall-clock instant.
    pub fn status_at(&self, now: NaiveDateTime) -> ScheduleStatus {
        if self.days.is_empty() {
            return ScheduleStatus::NoSchedule;
        }
        let (Some(start), Some(end)) = (
            parse_minutes(&self.start_time),
            parse_minutes(&self.end_time),
        ) else {
            return ScheduleStatus::NoSchedule;
        };

        let today = weekday_name(now.weekday());
        if !self.days.iter().any(|d| d.eq_ignore_ascii_case(today)) {
            return ScheduleStatus::WrongDay;
        }

        let minute = now.hour() * 60 + now.minute();
        if minute < start {
            ScheduleStatus::BeforeStart
        } else if minute <= end {
            ScheduleStatus::InWindow
        } else {
            ScheduleStatus::AfterEnd
        }
    }

    /// Whether the class should show up in "active today" listings: it is
    /// scheduled for today and the window has not closed yet.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        matches!(
            self.status_at(now),
            ScheduleStatus::BeforeStart | ScheduleStatus::InWindow
        )
    }

    /// Human-readable window, used in schedule-rejection messages.
    pub fn window_label(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

/// Parses `"HH:MM"` into minutes since midnight. `None` on any malformed input.
fn parse_minutes(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Full English weekday name, matching what class schedules store.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
        // 2026-08-24 is a Monday.
        NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn schedule(days: &[&str], start: &str, end: &str) -> Schedule {
        Schedule {
            days: days.iter().map(|d| d.to_string()).collect(),
            start_time: start.into(),
            end_time: end.into(),
        }
    }

    #[test]
    fn empty_days_is_no_schedule() {
        let s = schedule(&[], "09:00", "10:00");
        assert_eq!(s.status_at(monday_at(9, 30)), ScheduleStatus::NoSchedule);
    }

    #[test]
    fn malformed_times_are_no_schedule() {
        for bad in ["9am", "25:00", "09:60", "", "0900"] {
            let s = schedule(&["Monday"], bad, "10:00");
            assert_eq!(s.status_at(monday_at(9, 30)), ScheduleStatus::NoSchedule);
        }
    }

    #[test]
    fn wrong_day_beats_time_checks() {
        let s = schedule(&["Tuesday"], "09:00", "10:00");
        assert_eq!(s.status_at(monday_at(9, 30)), ScheduleStatus::WrongDay);
    }

    #[test]
    fn day_match_is_case_insensitive() {
        let s = schedule(&["monday"], "09:00", "10:00");
        assert_eq!(s.status_at(monday_at(9, 30)), ScheduleStatus::InWindow);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let s = schedule(&["Monday"], "09:00", "10:00");
        assert_eq!(s.status_at(monday_at(8, 59)), ScheduleStatus::BeforeStart);
        assert_eq!(s.status_at(monday_at(9, 0)), ScheduleStatus::InWindow);
        assert_eq!(s.status_at(monday_at(10, 0)), ScheduleStatus::InWindow);
        assert_eq!(s.status_at(monday_at(10, 1)), ScheduleStatus::AfterEnd);
    }

    #[test]
    fn active_means_not_yet_ended_on_a_scheduled_day() {
        let s = schedule(&["Monday"], "09:00", "10:00");
        assert!(s.is_active_at(monday_at(7, 0)));
        assert!(s.is_active_at(monday_at(9, 30)));
        assert!(!s.is_active_at(monday_at(11, 0)));

        let other_day = schedule(&["Friday"], "09:00", "10:00");
        assert!(!other_day.is_active_at(monday_at(9, 30)));
    }
}
