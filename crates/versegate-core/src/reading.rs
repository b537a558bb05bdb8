//! Daily unlock ritual.
//!
//! ## State Transitions
//!
//! ```text
//! Locked --acknowledge_verse--> VerseRead --acknowledge_devotional--> Unlocked
//!    |                                                                   ^
//!    +----------------------unlock_without_reading-----------------------+
//! ```
//!
//! State is recomputed from the stored [`DailyReadingState`] for the
//! current date. A record from any other day reads as `Locked`. Going back
//! to `Locked` never re-applies the block; only the next interval start
//! does that.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::UnlockError;
use crate::shield::ShieldProvider;
use crate::storage::{get_json, keys, put_json, KvStore};
use crate::streak::StreakTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReadingState {
    pub date: NaiveDate,
    pub verse_read: bool,
    pub devotional_read: bool,
}

impl DailyReadingState {
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            verse_read: false,
            devotional_read: false,
        }
    }

    /// Ritual state on `today`. Flags from another day are ignored.
    ///
    /// `devotional_read` alone is enough for `Unlocked`: the escape hatch
    /// sets it without the verse.
    pub fn state_on(&self, today: NaiveDate) -> ReadingState {
        if self.date != today {
            ReadingState::Locked
        } else if self.devotional_read {
            ReadingState::Unlocked
        } else if self.verse_read {
            ReadingState::VerseRead
        } else {
            ReadingState::Locked
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingState {
    Locked,
    VerseRead,
    Unlocked,
}

/// Result of a user action on the ritual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub date: NaiveDate,
    pub from: ReadingState,
    pub to: ReadingState,
    /// Current streak after the action, set once the ritual completes.
    pub streak: Option<u32>,
    /// Whether the verse step was bypassed.
    pub verse_skipped: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

pub struct UnlockStateMachine<'a, S: KvStore + ?Sized, P: ShieldProvider> {
    store: &'a S,
    shield: P,
}

impl<'a, S: KvStore + ?Sized, P: ShieldProvider> UnlockStateMachine<'a, S, P> {
    pub fn new(store: &'a S, shield: P) -> Self {
        Self { store, shield }
    }

    /// Today's record; a missing, corrupt or stale record yields a fresh one.
    pub fn daily_state_on(&self, today: NaiveDate) -> DailyReadingState {
        match get_json::<S, DailyReadingState>(self.store, keys::DAILY_READING_STATE) {
            Some(state) if state.date == today => state,
            _ => DailyReadingState::fresh(today),
        }
    }

    pub fn current_state(&self) -> ReadingState {
        self.current_state_on(Local::now().date_naive())
    }

    pub fn current_state_on(&self, today: NaiveDate) -> ReadingState {
        self.daily_state_on(today).state_on(today)
    }

    /// Foreground refresh: replace a stale record with a fresh one for
    /// `today` and report the resulting state.
    pub fn on_foreground_on(&self, today: NaiveDate) -> Result<ReadingState, UnlockError> {
        let stored = get_json::<S, DailyReadingState>(self.store, keys::DAILY_READING_STATE);
        if stored.map(|s| s.date) != Some(today) {
            put_json(
                self.store,
                keys::DAILY_READING_STATE,
                &DailyReadingState::fresh(today),
            )?;
            tracing::info!(%today, "daily reading state reset");
            return Ok(ReadingState::Locked);
        }
        Ok(self.current_state_on(today))
    }

    pub fn acknowledge_verse(&self) -> Result<Transition, UnlockError> {
        self.acknowledge_verse_on(Local::now().date_naive())
    }

    /// Mark today's verse as read. Does not clear the block.
    pub fn acknowledge_verse_on(&self, today: NaiveDate) -> Result<Transition, UnlockError> {
        let mut daily = self.daily_state_on(today);
        let from = daily.state_on(today);
        if !daily.verse_read {
            daily.verse_read = true;
            put_json(self.store, keys::DAILY_READING_STATE, &daily)?;
            tracing::info!(%today, "verse acknowledged");
        }
        Ok(Transition {
            date: today,
            from,
            to: daily.state_on(today),
            streak: None,
            verse_skipped: false,
        })
    }

    pub fn acknowledge_devotional(&self) -> Result<Transition, UnlockError> {
        self.acknowledge_devotional_on(Local::now().date_naive())
    }

    /// Mark today's devotional as read, clear the block and record the
    /// streak.
    ///
    /// # Errors
    /// `VerseNotRead` if the verse has not been acknowledged today.
    pub fn acknowledge_devotional_on(&self, today: NaiveDate) -> Result<Transition, UnlockError> {
        let daily = self.daily_state_on(today);
        if !daily.verse_read && !daily.devotional_read {
            return Err(UnlockError::VerseNotRead);
        }
        self.complete(daily, today, false)
    }

    pub fn unlock_without_reading(&self) -> Result<Transition, UnlockError> {
        self.unlock_without_reading_on(Local::now().date_naive())
    }

    /// Escape hatch: unlock without reading the verse.
    ///
    /// Leaves `verse_read` untouched, so the stored record may hold
    /// `devotional_read && !verse_read`. Counts toward the streak like a
    /// regular completion.
    pub fn unlock_without_reading_on(&self, today: NaiveDate) -> Result<Transition, UnlockError> {
        let daily = self.daily_state_on(today);
        let skipped = !daily.verse_read;
        self.complete(daily, today, skipped)
    }

    fn complete(
        &self,
        mut daily: DailyReadingState,
        today: NaiveDate,
        verse_skipped: bool,
    ) -> Result<Transition, UnlockError> {
        let from = daily.state_on(today);
        if !daily.devotional_read {
            daily.devotional_read = true;
            put_json(self.store, keys::DAILY_READING_STATE, &daily)?;
        }

        let streak = StreakTracker::new(self.store).record_completion_on(today)?;

        // Re-clearing on a repeated acknowledgement is harmless and lets a
        // failed clear be retried.
        self.shield.clear_block()?;

        if from != ReadingState::Unlocked {
            tracing::info!(%today, streak, verse_skipped, "unlocked");
        }
        Ok(Transition {
            date: today,
            from,
            to: ReadingState::Unlocked,
            streak: Some(streak),
            verse_skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShieldError;
    use crate::selection::Selection;
    use crate::storage::Database;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingShield {
        clears: Cell<u32>,
    }

    impl ShieldProvider for CountingShield {
        fn policy_store(&self) -> &str {
            "test"
        }

        fn apply_block(&self, _selection: &Selection) -> Result<(), ShieldError> {
            Ok(())
        }

        fn clear_block(&self) -> Result<(), ShieldError> {
            self.clears.set(self.clears.get() + 1);
            Ok(())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn verse_then_devotional_unlocks() {
        let db = Database::open_memory().unwrap();
        let shield = CountingShield::default();
        let machine = UnlockStateMachine::new(&db, &shield);

        assert_eq!(machine.current_state_on(day(1)), ReadingState::Locked);

        let verse = machine.acknowledge_verse_on(day(1)).unwrap();
        assert_eq!((verse.from, verse.to), (ReadingState::Locked, ReadingState::VerseRead));
        assert_eq!(shield.clears.get(), 0);

        let devotional = machine.acknowledge_devotional_on(day(1)).unwrap();
        assert_eq!(devotional.to, ReadingState::Unlocked);
        assert_eq!(devotional.streak, Some(1));
        assert_eq!(shield.clears.get(), 1);
    }

    #[test]
    fn devotional_before_verse_is_rejected() {
        let db = Database::open_memory().unwrap();
        let shield = CountingShield::default();
        let machine = UnlockStateMachine::new(&db, &shield);

        let err = machine.acknowledge_devotional_on(day(1)).unwrap_err();
        assert!(matches!(err, UnlockError::VerseNotRead));
        assert_eq!(machine.current_state_on(day(1)), ReadingState::Locked);
        assert_eq!(shield.clears.get(), 0);
    }

    #[test]
    fn stale_record_reads_locked() {
        let db = Database::open_memory().unwrap();
        let stale = DailyReadingState {
            date: day(1),
            verse_read: true,
            devotional_read: true,
        };
        put_json(&db, keys::DAILY_READING_STATE, &stale).unwrap();

        let machine = UnlockStateMachine::new(&db, CountingShield::default());
        assert_eq!(machine.current_state_on(day(1)), ReadingState::Unlocked);
        assert_eq!(machine.current_state_on(day(2)), ReadingState::Locked);
    }

    #[test]
    fn foreground_resets_stale_record() {
        let db = Database::open_memory().unwrap();
        let machine = UnlockStateMachine::new(&db, CountingShield::default());
        machine.acknowledge_verse_on(day(1)).unwrap();

        assert_eq!(machine.on_foreground_on(day(2)).unwrap(), ReadingState::Locked);
        let stored: DailyReadingState = get_json(&db, keys::DAILY_READING_STATE).unwrap();
        assert_eq!(stored, DailyReadingState::fresh(day(2)));

        machine.acknowledge_verse_on(day(2)).unwrap();
        assert_eq!(machine.on_foreground_on(day(2)).unwrap(), ReadingState::VerseRead);
    }

    #[test]
    fn foreground_reset_does_not_reblock() {
        let db = Database::open_memory().unwrap();
        let shield = CountingShield::default();
        let machine = UnlockStateMachine::new(&db, &shield);
        machine.acknowledge_verse_on(day(1)).unwrap();
        machine.acknowledge_devotional_on(day(1)).unwrap();

        machine.on_foreground_on(day(2)).unwrap();
        assert_eq!(shield.clears.get(), 1);
    }

    #[test]
    fn repeated_devotional_keeps_streak() {
        let db = Database::open_memory().unwrap();
        let machine = UnlockStateMachine::new(&db, CountingShield::default());
        machine.acknowledge_verse_on(day(1)).unwrap();
        machine.acknowledge_devotional_on(day(1)).unwrap();
        let again = machine.acknowledge_devotional_on(day(1)).unwrap();
        assert!(!again.changed());
        assert_eq!(again.streak, Some(1));
        assert_eq!(StreakTracker::new(&db).total_days(), 1);
    }

    #[test]
    fn escape_hatch_unlocks_without_verse() {
        let db = Database::open_memory().unwrap();
        let shield = CountingShield::default();
        let machine = UnlockStateMachine::new(&db, &shield);

        let t = machine.unlock_without_reading_on(day(3)).unwrap();
        assert!(t.verse_skipped);
        assert_eq!((t.from, t.to), (ReadingState::Locked, ReadingState::Unlocked));
        assert_eq!(shield.clears.get(), 1);

        let stored = machine.daily_state_on(day(3));
        assert!(stored.devotional_read);
        assert!(!stored.verse_read);
        assert_eq!(StreakTracker::new(&db).record().current_streak, 1);
    }

    #[test]
    fn verse_after_escape_hatch_stays_unlocked() {
        let db = Database::open_memory().unwrap();
        let machine = UnlockStateMachine::new(&db, CountingShield::default());
        machine.unlock_without_reading_on(day(3)).unwrap();
        let t = machine.acknowledge_verse_on(day(3)).unwrap();
        assert_eq!((t.from, t.to), (ReadingState::Unlocked, ReadingState::Unlocked));
    }
}
