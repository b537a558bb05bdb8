//! # Versegate Core Library
//!
//! Blocks distracting apps every day until a short devotional ritual is
//! completed. The library holds everything except the UI and the OS-level
//! blocking itself:
//!
//! ## Architecture
//!
//! - **Storage**: a SQLite key/value store shared by the app and the
//!   out-of-process trigger handler. It is their only channel.
//! - **Selection**: the saved set of apps, categories and domains to block.
//! - **Schedule**: the daily `[start, 23:59)` local-time interval and its
//!   idempotent arm/disarm against the OS scheduler.
//! - **Trigger**: interval start/end handlers run in a fresh process.
//! - **Reading**: the `Locked -> VerseRead -> Unlocked` daily state machine.
//! - **Streak**: consecutive-day and lifetime completion counts.
//!
//! ## Key Components
//!
//! - [`App`]: explicit service bundle over one store handle
//! - [`Database`]: the durable shared store
//! - [`ScheduleController`]: arms the daily interval
//! - [`TriggerHandler`]: applies and clears the block
//! - [`UnlockStateMachine`]: drives the reading ritual
//! - [`ShieldProvider`]: trait for the blocking backend

pub mod app;
pub mod error;
pub mod onboarding;
pub mod reading;
pub mod schedule;
pub mod selection;
pub mod shield;
pub mod storage;
pub mod streak;
pub mod trigger;

pub use app::{App, ForegroundSnapshot};
pub use error::{
    ConfigError, CoreError, EncodeError, ScheduleError, ShieldError, StoreError, UnlockError,
};
pub use reading::{DailyReadingState, ReadingState, Transition, UnlockStateMachine};
pub use schedule::{
    ArmState, Boundary, DailyInterval, IntervalScheduler, Registration, Schedule,
    ScheduleController, StoreIntervalScheduler,
};
pub use selection::{Selection, SelectionRepository};
pub use shield::{ShieldProvider, ShieldState, StoreShield};
pub use storage::{Config, Database, KvStore};
pub use streak::{StreakRecord, StreakTracker};
pub use trigger::{Dispatch, SkipReason, TriggerHandler, TriggerOutcome};
