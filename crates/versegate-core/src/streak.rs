//! Consecutive-day streak accounting.
//!
//! All four counters live in one serialized [`StreakRecord`] so a reader
//! never observes a torn update across fields.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::storage::{get_json, keys, put_json, KvStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub last_completed_date: Option<NaiveDate>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed_days: u32,
}

impl StreakRecord {
    /// Apply a completion on `today`. Returns `false` when it was already
    /// recorded (same day, or a clock that moved backwards).
    pub fn complete(&mut self, today: NaiveDate) -> bool {
        match self.last_completed_date {
            Some(last) if last >= today => return false,
            Some(last) if (today - last).num_days() == 1 => self.current_streak += 1,
            _ => self.current_streak = 1,
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_completed_days += 1;
        self.last_completed_date = Some(today);
        true
    }

    /// The streak as it should be displayed on `today`, without mutation.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        match self.last_completed_date {
            Some(last) if (today - last).num_days() <= 1 => self.current_streak,
            _ => 0,
        }
    }
}

pub struct StreakTracker<'a, S: KvStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KvStore + ?Sized> StreakTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The stored record; absent or corrupt records read as empty.
    pub fn record(&self) -> StreakRecord {
        get_json(self.store, keys::STREAK_RECORD).unwrap_or_default()
    }

    pub fn record_completion(&self) -> Result<u32, StoreError> {
        self.record_completion_on(Local::now().date_naive())
    }

    /// Record that the ritual was completed on `today`.
    ///
    /// Returns the current streak. Repeated calls on the same day leave the
    /// record untouched.
    pub fn record_completion_on(&self, today: NaiveDate) -> Result<u32, StoreError> {
        let mut record = self.record();
        if !record.complete(today) {
            tracing::debug!(%today, streak = record.current_streak, "completion already recorded");
            return Ok(record.current_streak);
        }
        put_json(self.store, keys::STREAK_RECORD, &record)?;
        tracing::info!(
            %today,
            current = record.current_streak,
            longest = record.longest_streak,
            total = record.total_completed_days,
            "streak updated"
        );
        Ok(record.current_streak)
    }

    pub fn current_streak_if_queried(&self) -> u32 {
        self.current_streak_if_queried_on(Local::now().date_naive())
    }

    /// Streak for display: 0 once more than one day has passed since the last
    /// completion, otherwise the stored value.
    pub fn current_streak_if_queried_on(&self, today: NaiveDate) -> u32 {
        self.record().current_as_of(today)
    }

    pub fn longest_streak(&self) -> u32 {
        self.record().longest_streak
    }

    pub fn total_days(&self) -> u32 {
        self.record().total_completed_days
    }
}
