//! Explicitly constructed service bundle.
//!
//! [`App`] owns the store handle and configuration and hands out
//! short-lived service views borrowing them. There are no process-wide
//! singletons; the trigger process and the app each build their own.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::Path;

use crate::error::{CoreError, ShieldError, StoreError, UnlockError};
use crate::onboarding;
use crate::reading::{DailyReadingState, ReadingState, UnlockStateMachine};
use crate::schedule::{
    ArmState, Registration, Schedule, ScheduleController, StoreIntervalScheduler,
};
use crate::selection::{Selection, SelectionRepository};
use crate::shield::StoreShield;
use crate::storage::{Config, Database, KvStore};
use crate::streak::StreakTracker;
use crate::trigger::{Dispatch, TriggerHandler};

/// Everything the presentation layer needs after the app comes to the
/// foreground.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForegroundSnapshot {
    pub date: NaiveDate,
    pub reading: ReadingState,
    pub daily: DailyReadingState,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
    pub onboarding_completed: bool,
    pub schedule: ArmState,
    pub saved_schedule: Schedule,
    pub block_active: bool,
    pub selection_targets: usize,
}

pub struct App<S: KvStore = Database> {
    store: S,
    secondary: Option<Database>,
    config: Config,
}

impl App<Database> {
    /// Open the shared store in the data directory, plus the secondary
    /// scope when one is configured.
    ///
    /// # Errors
    /// Returns an error if the primary store cannot be opened. A secondary
    /// scope that fails to open is logged and skipped.
    pub fn open(config: Config) -> Result<Self, StoreError> {
        let store = Database::open()?;
        let secondary = config
            .secondary_scope()
            .and_then(|dir| match open_secondary(&dir) {
                Ok(db) => Some(db),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "secondary scope unavailable");
                    None
                }
            });
        Ok(Self {
            store,
            secondary,
            config,
        })
    }
}

fn open_secondary(dir: &Path) -> Result<Database, StoreError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Database::open_at(&dir.join("versegate.db"))
}

impl<S: KvStore> App<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            secondary: None,
            config,
        }
    }

    pub fn with_secondary(mut self, secondary: Database) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selections(&self) -> SelectionRepository<'_, S> {
        let repo = SelectionRepository::new(&self.store);
        match &self.secondary {
            Some(secondary) => repo.with_secondary(secondary),
            None => repo,
        }
    }

    pub fn shield(&self) -> StoreShield<'_, S> {
        StoreShield::new(&self.store, self.config.shield.policy_store.clone())
    }

    pub fn schedule(&self) -> ScheduleController<'_, S, StoreIntervalScheduler<'_, S>> {
        let default = Schedule::new(
            self.config.schedule.default_start_hour,
            self.config.schedule.default_start_minute,
        )
        .unwrap_or_default();
        ScheduleController::new(&self.store, StoreIntervalScheduler::new(&self.store))
            .with_settle(self.config.arm_settle())
            .with_default(default)
    }

    pub fn trigger(&self) -> TriggerHandler<'_, S, StoreShield<'_, S>> {
        TriggerHandler::new(&self.store, self.shield())
    }

    pub fn unlock(&self) -> UnlockStateMachine<'_, S, StoreShield<'_, S>> {
        UnlockStateMachine::new(&self.store, self.shield())
    }

    pub fn streak(&self) -> StreakTracker<'_, S> {
        StreakTracker::new(&self.store)
    }

    pub fn onboarding_completed(&self) -> bool {
        onboarding::is_completed(&self.store)
    }

    pub fn set_onboarding_completed(&self, completed: bool) -> Result<(), StoreError> {
        onboarding::set_completed(&self.store, completed)
    }

    /// Setup flow: save the selection, then arm the schedule.
    ///
    /// The selection stays saved when arming fails, so the caller can offer
    /// a retry without asking the user to select apps again.
    pub fn save_and_arm_at(
        &self,
        selection: &Selection,
        schedule: &Schedule,
        now: NaiveDateTime,
    ) -> Result<Registration, CoreError> {
        self.selections().save(selection)?;
        let registration = self.schedule().arm_at(schedule, now)?;
        Ok(registration)
    }

    /// Dispatch the due interval boundary, if any, as the trigger process.
    pub fn tick_at(&self, now: NaiveDateTime) -> Result<Option<Dispatch>, ShieldError> {
        let registration = self.schedule().registration();
        self.trigger().tick_at(now, registration.as_ref())
    }

    pub fn on_foreground(&self) -> Result<ForegroundSnapshot, UnlockError> {
        self.on_foreground_on(Local::now().date_naive())
    }

    /// Refresh the daily reading state and gather what the UI shows.
    pub fn on_foreground_on(&self, today: NaiveDate) -> Result<ForegroundSnapshot, UnlockError> {
        let unlock = self.unlock();
        let reading = unlock.on_foreground_on(today)?;
        let streak = self.streak().record();
        let schedule = self.schedule();
        Ok(ForegroundSnapshot {
            date: today,
            reading,
            daily: unlock.daily_state_on(today),
            current_streak: streak.current_as_of(today),
            longest_streak: streak.longest_streak,
            total_days: streak.total_completed_days,
            onboarding_completed: self.onboarding_completed(),
            schedule: schedule.status(),
            saved_schedule: schedule.saved_schedule(),
            block_active: self.shield().is_active(),
            selection_targets: self.selections().load().map_or(0, |s| s.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageConfig;
    use chrono::NaiveDate;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.schedule.arm_settle_ms = 0;
        config
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn fresh_install_snapshot() {
        let app = App::new(Database::open_memory().unwrap(), test_config());
        let snapshot = app.on_foreground_on(at(9, 0).date()).unwrap();
        assert_eq!(snapshot.reading, ReadingState::Locked);
        assert_eq!(snapshot.schedule, ArmState::Disarmed);
        assert_eq!(snapshot.saved_schedule, Schedule::default());
        assert!(!snapshot.onboarding_completed);
        assert!(!snapshot.block_active);
        assert_eq!(snapshot.selection_targets, 0);
    }

    #[test]
    fn configured_default_start_is_reported() {
        let mut config = test_config();
        config.schedule.default_start_hour = 6;
        config.schedule.default_start_minute = 0;
        let app = App::new(Database::open_memory().unwrap(), config);
        assert_eq!(app.schedule().saved_schedule(), Schedule::new(6, 0).unwrap());
    }

    #[test]
    fn save_and_arm_then_tick_blocks() {
        let app = App::new(Database::open_memory().unwrap(), test_config());
        let selection = Selection::new().with_application("a").with_application("b");
        app.save_and_arm_at(&selection, &Schedule::default(), at(9, 0))
            .unwrap();

        let dispatch = app.tick_at(at(14, 37)).unwrap().unwrap();
        assert!(matches!(
            dispatch.outcome,
            crate::trigger::TriggerOutcome::Applied { targets: 2 }
        ));
        assert_eq!(app.shield().active().unwrap().selection, selection);
    }

    #[test]
    fn secondary_scope_receives_copy() {
        let config = Config {
            storage: StorageConfig {
                secondary_scope: Some("unused".into()),
            },
            ..test_config()
        };
        let app = App::new(Database::open_memory().unwrap(), config)
            .with_secondary(Database::open_memory().unwrap());
        let selection = Selection::new().with_category("social");
        app.selections().save(&selection).unwrap();
        assert_eq!(app.selections().load_secondary(), Some(selection));
    }
}
