//! Daily blocking schedule.
//!
//! The blocking window runs from a user-chosen start time to a fixed
//! 23:59 end, every day, in local wall-clock time. Times are naive on
//! purpose: the window follows the device timezone rather than UTC.

mod controller;
mod store_scheduler;

pub use controller::{
    ArmState, IntervalScheduler, Registration, ScheduleController, DAILY_ACTIVITY,
};
pub use store_scheduler::StoreIntervalScheduler;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

pub const DEFAULT_START_HOUR: u32 = 14;
pub const DEFAULT_START_MINUTE: u32 = 37;
pub const END_HOUR: u32 = 23;
pub const END_MINUTE: u32 = 59;

/// User-facing daily schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub start_hour: u32,
    pub start_minute: u32,
    pub repeats: bool,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            start_minute: DEFAULT_START_MINUTE,
            repeats: true,
        }
    }
}

impl Schedule {
    /// Build a repeating schedule starting at `hour:minute`.
    ///
    /// # Errors
    /// Returns `InvalidStart` unless the start is a valid time strictly
    /// before 23:59.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        let schedule = Self {
            start_hour: hour,
            start_minute: minute,
            repeats: true,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        let in_range = self.start_hour <= 23 && self.start_minute <= 59;
        if !in_range || (self.start_hour, self.start_minute) >= (END_HOUR, END_MINUTE) {
            return Err(ScheduleError::InvalidStart {
                hour: self.start_hour,
                minute: self.start_minute,
            });
        }
        Ok(())
    }

    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour, self.start_minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn interval(&self) -> DailyInterval {
        DailyInterval {
            start: self.start_time(),
            end: end_of_day(),
            repeats: self.repeats,
        }
    }
}

/// The 23:59 end of every blocking window.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(END_HOUR, END_MINUTE, 0).unwrap_or(NaiveTime::MIN)
}

/// Local-time interval `[start, end)` registered with the OS scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub repeats: bool,
}

impl DailyInterval {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }

    /// First time the interval start fires when armed at `armed_at`.
    ///
    /// A start that has already been reached today is deferred to the
    /// next day; the OS primitive never fires a start retroactively.
    pub fn first_firing(&self, armed_at: NaiveDateTime) -> NaiveDateTime {
        let today = armed_at.date();
        if armed_at.time() < self.start {
            today.and_time(self.start)
        } else {
            (today + Duration::days(1)).and_time(self.start)
        }
    }

    /// Most recent boundary at or before `now`.
    pub fn latest_boundary(&self, now: NaiveDateTime) -> Boundary {
        let today = now.date();
        let time = now.time();
        if time >= self.end {
            Boundary::End(today.and_time(self.end))
        } else if time >= self.start {
            Boundary::Start(today.and_time(self.start))
        } else {
            Boundary::End((today - Duration::days(1)).and_time(self.end))
        }
    }
}

/// An interval edge at a concrete local instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "lowercase")]
pub enum Boundary {
    Start(NaiveDateTime),
    End(NaiveDateTime),
}

impl Boundary {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            Boundary::Start(at) | Boundary::End(at) => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn default_is_1437_repeating() {
        let s = Schedule::default();
        assert_eq!((s.start_hour, s.start_minute, s.repeats), (14, 37, true));
    }

    #[test]
    fn rejects_start_at_or_after_end() {
        assert!(Schedule::new(23, 59).is_err());
        assert!(Schedule::new(24, 0).is_err());
        assert!(Schedule::new(10, 60).is_err());
        assert!(Schedule::new(23, 58).is_ok());
        assert!(Schedule::new(0, 0).is_ok());
    }

    #[test]
    fn interval_runs_to_end_of_day() {
        let interval = Schedule::default().interval();
        assert!(interval.contains(NaiveTime::from_hms_opt(14, 37, 0).unwrap()));
        assert!(interval.contains(NaiveTime::from_hms_opt(23, 58, 59).unwrap()));
        assert!(!interval.contains(NaiveTime::from_hms_opt(23, 59, 0).unwrap()));
        assert!(!interval.contains(NaiveTime::from_hms_opt(14, 36, 59).unwrap()));
    }

    #[test]
    fn first_firing_today_when_start_ahead() {
        let interval = Schedule::default().interval();
        assert_eq!(interval.first_firing(at(5, 9, 0)), at(5, 14, 37));
    }

    #[test]
    fn first_firing_deferred_when_start_passed() {
        let interval = Schedule::default().interval();
        assert_eq!(interval.first_firing(at(5, 15, 0)), at(6, 14, 37));
        assert_eq!(interval.first_firing(at(5, 14, 37)), at(6, 14, 37));
    }

    #[test]
    fn latest_boundary_across_the_day() {
        let interval = Schedule::default().interval();
        assert_eq!(interval.latest_boundary(at(5, 8, 0)), Boundary::End(at(4, 23, 59)));
        assert_eq!(interval.latest_boundary(at(5, 14, 37)), Boundary::Start(at(5, 14, 37)));
        assert_eq!(interval.latest_boundary(at(5, 20, 0)), Boundary::Start(at(5, 14, 37)));
        assert_eq!(interval.latest_boundary(at(5, 23, 59)), Boundary::End(at(5, 23, 59)));
    }

    proptest! {
        #[test]
        fn first_firing_is_never_before_arming(
            hour in 0u32..23,
            minute in 0u32..60,
            armed_minutes in 0u32..(24 * 60),
        ) {
            let interval = Schedule::new(hour, minute).unwrap().interval();
            let armed_at = at(10, armed_minutes / 60, armed_minutes % 60);
            let first = interval.first_firing(armed_at);
            prop_assert!(first >= armed_at);
            prop_assert!(first - armed_at <= Duration::days(1));
            prop_assert_eq!(first.time(), interval.start);
        }

        #[test]
        fn inside_interval_means_latest_boundary_is_today_start(
            minutes in 0u32..(24 * 60),
        ) {
            let interval = Schedule::default().interval();
            let now = at(10, minutes / 60, minutes % 60);
            let inside = interval.contains(now.time());
            let is_start = matches!(interval.latest_boundary(now), Boundary::Start(_));
            prop_assert_eq!(inside, is_start);
        }
    }
}
