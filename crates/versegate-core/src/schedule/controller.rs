//! Arming and disarming the recurring daily interval.
//!
//! ```text
//! Disarmed --arm--> Armed(schedule) --arm--> Armed(schedule')
//!    ^                    |
//!    +------disarm--------+
//! ```
//!
//! `arm` always stops the previous registration first, waits a bounded
//! settle delay, then registers again. The delay only narrows the window
//! in which the OS scheduler could observe the old and new registrations
//! out of order; it does not close it.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DailyInterval, Schedule};
use crate::error::ScheduleError;
use crate::storage::{get_json, keys, put_json, KvStore};

/// Activity name of the daily blocking interval.
pub const DAILY_ACTIVITY: &str = "daily_block";

/// A recurring interval as registered with the OS scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub activity: String,
    pub interval: DailyInterval,
    pub armed_at: NaiveDateTime,
    pub first_firing: NaiveDateTime,
}

impl Registration {
    pub fn new(activity: &str, interval: DailyInterval, armed_at: NaiveDateTime) -> Self {
        Self {
            activity: activity.to_string(),
            interval,
            armed_at,
            first_firing: interval.first_firing(armed_at),
        }
    }
}

/// The OS recurring-trigger primitive.
pub trait IntervalScheduler {
    /// Register a recurring interval. Registering an activity that is
    /// already active replaces it.
    fn start_monitoring(&self, registration: &Registration) -> Result<(), ScheduleError>;

    /// Stop an activity. Stopping an inactive activity is a no-op.
    fn stop_monitoring(&self, activity: &str) -> Result<(), ScheduleError>;

    /// Currently registered intervals.
    fn registrations(&self) -> Vec<Registration>;
}

impl<T: IntervalScheduler + ?Sized> IntervalScheduler for &T {
    fn start_monitoring(&self, registration: &Registration) -> Result<(), ScheduleError> {
        (**self).start_monitoring(registration)
    }

    fn stop_monitoring(&self, activity: &str) -> Result<(), ScheduleError> {
        (**self).stop_monitoring(activity)
    }

    fn registrations(&self) -> Vec<Registration> {
        (**self).registrations()
    }
}

/// Whether the daily interval is currently registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "schedule", rename_all = "lowercase")]
pub enum ArmState {
    Disarmed,
    Armed(Schedule),
}

/// Persists the chosen start time and keeps the OS registration in sync.
pub struct ScheduleController<'a, S: KvStore + ?Sized, O: IntervalScheduler> {
    store: &'a S,
    scheduler: O,
    settle: Duration,
    default: Schedule,
}

impl<'a, S: KvStore + ?Sized, O: IntervalScheduler> ScheduleController<'a, S, O> {
    pub fn new(store: &'a S, scheduler: O) -> Self {
        Self {
            store,
            scheduler,
            settle: Duration::ZERO,
            default: Schedule::default(),
        }
    }

    /// Bounded wait between disarm and re-arm.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Schedule reported when nothing valid has been saved.
    pub fn with_default(mut self, default: Schedule) -> Self {
        self.default = default;
        self
    }

    /// The persisted schedule, or the default when unset or invalid.
    pub fn saved_schedule(&self) -> Schedule {
        let hour = get_json::<S, u32>(self.store, keys::SCHEDULE_START_HOUR);
        let minute = get_json::<S, u32>(self.store, keys::SCHEDULE_START_MINUTE);
        let schedule = Schedule {
            start_hour: hour.unwrap_or(self.default.start_hour),
            start_minute: minute.unwrap_or(self.default.start_minute),
            repeats: true,
        };
        match schedule.validate() {
            Ok(()) => schedule,
            Err(e) => {
                tracing::warn!(error = %e, "stored schedule invalid, using default");
                self.default
            }
        }
    }

    /// Persist the start time without touching the OS registration.
    pub fn save_schedule(&self, schedule: &Schedule) -> Result<(), ScheduleError> {
        schedule.validate()?;
        put_json(self.store, keys::SCHEDULE_START_HOUR, &schedule.start_hour)?;
        put_json(self.store, keys::SCHEDULE_START_MINUTE, &schedule.start_minute)?;
        Ok(())
    }

    /// Arm `schedule` as of the current local time.
    pub fn arm(&self, schedule: &Schedule) -> Result<Registration, ScheduleError> {
        self.arm_at(schedule, Local::now().naive_local())
    }

    /// Persist `schedule` and (re)register the daily interval.
    ///
    /// # Errors
    /// Returns the scheduler's refusal unchanged. The saved selection is
    /// never touched, so a later retry needs no re-selection.
    pub fn arm_at(
        &self,
        schedule: &Schedule,
        now: NaiveDateTime,
    ) -> Result<Registration, ScheduleError> {
        self.save_schedule(schedule)?;

        self.disarm()?;
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }

        let registration = Registration::new(DAILY_ACTIVITY, schedule.interval(), now);
        if let Err(e) = self.scheduler.start_monitoring(&registration) {
            tracing::error!(
                activity = DAILY_ACTIVITY,
                error = %e,
                retryable = e.is_retryable(),
                "failed to arm daily interval"
            );
            return Err(e);
        }

        tracing::info!(
            start = %registration.interval.start,
            first_firing = %registration.first_firing,
            "daily interval armed"
        );
        Ok(registration)
    }

    /// Stop the daily interval. No-op when already disarmed.
    pub fn disarm(&self) -> Result<(), ScheduleError> {
        self.scheduler.stop_monitoring(DAILY_ACTIVITY)?;
        tracing::debug!(activity = DAILY_ACTIVITY, "daily interval disarmed");
        Ok(())
    }

    pub fn registration(&self) -> Option<Registration> {
        self.scheduler
            .registrations()
            .into_iter()
            .find(|r| r.activity == DAILY_ACTIVITY)
    }

    pub fn status(&self) -> ArmState {
        match self.registration() {
            Some(r) => ArmState::Armed(Schedule {
                start_hour: r.interval.start.hour(),
                start_minute: r.interval.start.minute(),
                repeats: r.interval.repeats,
            }),
            None => ArmState::Disarmed,
        }
    }
}
