//! Store-backed stand-in for the OS interval scheduler.
//!
//! All registrations live in one map under `scheduler.activities`.

use std::collections::BTreeMap;

use super::controller::{IntervalScheduler, Registration};
use crate::error::ScheduleError;
use crate::storage::{get_json, keys, put_json, KvStore};

/// Interval scheduler that keeps its registrations in the shared store.
///
/// Stands in for the OS device-activity scheduler: registrations survive
/// process restarts, and `trigger tick` reads them back from a fresh
/// process to decide which boundary is due.
pub struct StoreIntervalScheduler<'a, S: KvStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KvStore + ?Sized> StoreIntervalScheduler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn load(&self) -> BTreeMap<String, Registration> {
        get_json(self.store, keys::ACTIVITIES).unwrap_or_default()
    }

    fn save(&self, activities: &BTreeMap<String, Registration>) -> Result<(), ScheduleError> {
        put_json(self.store, keys::ACTIVITIES, activities)?;
        Ok(())
    }
}

impl<S: KvStore + ?Sized> IntervalScheduler for StoreIntervalScheduler<'_, S> {
    fn start_monitoring(&self, registration: &Registration) -> Result<(), ScheduleError> {
        let mut activities = self.load();
        activities.insert(registration.activity.clone(), registration.clone());
        self.save(&activities)
    }

    fn stop_monitoring(&self, activity: &str) -> Result<(), ScheduleError> {
        let mut activities = self.load();
        if activities.remove(activity).is_none() {
            return Ok(());
        }
        self.save(&activities)
    }

    fn registrations(&self) -> Vec<Registration> {
        self.load().into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use crate::storage::Database;
    use chrono::NaiveDate;

    fn registration(activity: &str) -> Registration {
        let armed_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Registration::new(activity, Schedule::default().interval(), armed_at)
    }

    #[test]
    fn registrations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let db = Database::open_at(&path).unwrap();
            StoreIntervalScheduler::new(&db)
                .start_monitoring(&registration("daily_block"))
                .unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        let regs = StoreIntervalScheduler::new(&db).registrations();
        assert_eq!(regs, vec![registration("daily_block")]);
    }

    #[test]
    fn restart_replaces_same_activity() {
        let db = Database::open_memory().unwrap();
        let scheduler = StoreIntervalScheduler::new(&db);
        scheduler.start_monitoring(&registration("a")).unwrap();
        scheduler.start_monitoring(&registration("a")).unwrap();
        scheduler.start_monitoring(&registration("b")).unwrap();
        assert_eq!(scheduler.registrations().len(), 2);
    }

    #[test]
    fn stopping_unknown_activity_writes_nothing() {
        let db = Database::open_memory().unwrap();
        let scheduler = StoreIntervalScheduler::new(&db);
        scheduler.stop_monitoring("never").unwrap();
        assert!(db.get(keys::ACTIVITIES).is_none());
    }
}
