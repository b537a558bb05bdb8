//! Out-of-process interval handler.
//!
//! The OS invokes these entry points in a fresh, short-lived process at the
//! start and end of the daily interval. Nothing in memory survives between
//! invocations; every input is re-read from the shared store.
//!
//! ## Boundaries
//!
//! - **Start**: apply the saved selection. A missing, corrupt or empty
//!   selection blocks nothing.
//! - **End**: clear unconditionally, whether or not the user unlocked.
//!
//! An interval whose start was dispatched always receives its end, even if
//! the schedule was re-armed or disarmed in between.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ShieldError;
use crate::schedule::{end_of_day, Boundary, Registration};
use crate::selection::SelectionRepository;
use crate::shield::ShieldProvider;
use crate::storage::{get_json, keys, put_json, KvStore};

/// Why an interval start blocked nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No selection saved, or the saved payload did not decode.
    NoSelection,
    /// A selection exists but targets nothing.
    IneffectiveSelection,
}

/// What a trigger invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Applied { targets: usize },
    Skipped { reason: SkipReason },
    Cleared,
}

/// A boundary handled by [`TriggerHandler::tick_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    pub boundary: Boundary,
    pub outcome: TriggerOutcome,
}

pub struct TriggerHandler<'a, S: KvStore + ?Sized, P: ShieldProvider> {
    store: &'a S,
    shield: P,
}

impl<'a, S: KvStore + ?Sized, P: ShieldProvider> TriggerHandler<'a, S, P> {
    pub fn new(store: &'a S, shield: P) -> Self {
        Self { store, shield }
    }

    /// Interval start: block the saved selection if it targets anything.
    ///
    /// # Errors
    /// Returns the provider's error if applying the block fails.
    pub fn on_interval_start(&self) -> Result<TriggerOutcome, ShieldError> {
        let Some(selection) = SelectionRepository::new(self.store).load() else {
            tracing::warn!("interval started with no usable selection, not blocking");
            return Ok(TriggerOutcome::Skipped {
                reason: SkipReason::NoSelection,
            });
        };
        if !selection.is_effective() {
            tracing::warn!("interval started with an empty selection, not blocking");
            return Ok(TriggerOutcome::Skipped {
                reason: SkipReason::IneffectiveSelection,
            });
        }

        self.shield.apply_block(&selection)?;
        tracing::info!(
            policy_store = self.shield.policy_store(),
            targets = selection.len(),
            "interval start: block applied"
        );
        Ok(TriggerOutcome::Applied {
            targets: selection.len(),
        })
    }

    /// Interval end: clear the block regardless of reading progress.
    ///
    /// # Errors
    /// Returns the provider's error if clearing fails.
    pub fn on_interval_end(&self) -> Result<TriggerOutcome, ShieldError> {
        self.shield.clear_block()?;
        tracing::info!(
            policy_store = self.shield.policy_store(),
            "interval end: block cleared"
        );
        Ok(TriggerOutcome::Cleared)
    }

    /// Last boundary dispatched by `tick`.
    pub fn last_boundary(&self) -> Option<Boundary> {
        get_json(self.store, keys::LAST_BOUNDARY)
    }

    pub fn tick(&self, registration: Option<&Registration>) -> Result<Option<Dispatch>, ShieldError> {
        self.tick_at(Local::now().naive_local(), registration)
    }

    /// Dispatch the most recent due boundary of `registration`, if it has not
    /// been handled yet.
    ///
    /// Suitable for a periodic job standing in for the OS scheduler. Missed
    /// boundaries collapse into the latest one, which always yields the
    /// correct block state for `now`. When nothing newer is due, the end of
    /// an already started interval is still dispatched at 23:59.
    pub fn tick_at(
        &self,
        now: NaiveDateTime,
        registration: Option<&Registration>,
    ) -> Result<Option<Dispatch>, ShieldError> {
        let last = self.last_boundary();
        let scheduled = registration
            .and_then(|r| scheduled_boundary(r, now))
            .filter(|b| last.map_or(true, |l| l.at() < b.at()));
        let Some(boundary) = scheduled.or_else(|| pending_end(last, now)) else {
            tracing::debug!(armed = registration.is_some(), "tick: nothing due");
            return Ok(None);
        };

        let outcome = match boundary {
            Boundary::Start(_) => self.on_interval_start()?,
            Boundary::End(_) => self.on_interval_end()?,
        };

        if let Err(e) = put_json(self.store, keys::LAST_BOUNDARY, &boundary) {
            // The handlers are idempotent, so a repeat dispatch is harmless.
            tracing::warn!(error = %e, "failed to record handled boundary");
        }
        Ok(Some(Dispatch { boundary, outcome }))
    }
}

/// Latest boundary of `registration` at or before `now` that the OS would
/// have fired.
fn scheduled_boundary(registration: &Registration, now: NaiveDateTime) -> Option<Boundary> {
    let boundary = registration.interval.latest_boundary(now);
    if boundary.at() < registration.first_firing {
        return None;
    }
    if !registration.interval.repeats && boundary.at().date() > registration.first_firing.date() {
        return None;
    }
    Some(boundary)
}

/// End of the interval started by `last`, once it is due.
fn pending_end(last: Option<Boundary>, now: NaiveDateTime) -> Option<Boundary> {
    let Some(Boundary::Start(started)) = last else {
        return None;
    };
    let end = started.date().and_time(end_of_day());
    (now >= end).then_some(Boundary::End(end))
}
