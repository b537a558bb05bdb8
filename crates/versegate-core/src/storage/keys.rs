//! Logical keys in the durable shared store.
//!
//! The app writes every key except [`LAST_BOUNDARY`] and the shield keys,
//! which belong to the trigger handler and the shield provider. Keeping
//! the writers disjoint means no key ever needs a cross-process lock.

pub const SELECTION: &str = "selection";
pub const SCHEDULE_START_HOUR: &str = "scheduleStartHour";
pub const SCHEDULE_START_MINUTE: &str = "scheduleStartMinute";
pub const DAILY_READING_STATE: &str = "dailyReadingState";
pub const STREAK_RECORD: &str = "streakRecord";
pub const ONBOARDING_COMPLETED: &str = "onboardingCompleted";

/// Last interval boundary handled by `trigger tick`.
pub const LAST_BOUNDARY: &str = "trigger.lastBoundary";

/// Interval registrations held by the store-backed scheduler.
pub const ACTIVITIES: &str = "scheduler.activities";

/// Prefix for shield state, suffixed with the policy store name.
pub const SHIELD_PREFIX: &str = "shield.";

pub fn shield(policy_store: &str) -> String {
    format!("{SHIELD_PREFIX}{policy_store}")
}
