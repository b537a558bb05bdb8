//! Integration tests for streak accounting through the unlock ritual.

use chrono::{Duration, NaiveDate};
use versegate_core::{App, Config, Database, ReadingState};

fn app() -> App<Database> {
    App::new(Database::open_memory().unwrap(), Config::default())
}

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap() + Duration::days(n)
}

fn complete(app: &App<Database>, today: NaiveDate) -> Option<u32> {
    app.on_foreground_on(today).unwrap();
    app.unlock().acknowledge_verse_on(today).unwrap();
    app.unlock().acknowledge_devotional_on(today).unwrap().streak
}

#[test]
fn consecutive_days_then_a_gap() {
    let app = app();

    assert_eq!(complete(&app, day(0)), Some(1));
    assert_eq!(complete(&app, day(1)), Some(2));

    // Day 2 skipped entirely.
    let snapshot = app.on_foreground_on(day(2)).unwrap();
    assert_eq!(snapshot.current_streak, 2);
    let snapshot = app.on_foreground_on(day(3)).unwrap();
    assert_eq!(snapshot.current_streak, 0, "streak at risk reads as zero");

    assert_eq!(complete(&app, day(3)), Some(1));
    let streak = app.streak();
    assert_eq!(streak.longest_streak(), 2);
    assert_eq!(streak.total_days(), 3);
}

#[test]
fn same_day_completion_counts_once() {
    let app = app();
    complete(&app, day(0));
    complete(&app, day(0));
    assert_eq!(app.streak().total_days(), 1);
    assert_eq!(app.unlock().current_state_on(day(0)), ReadingState::Unlocked);
}

#[test]
fn escape_hatch_counts_toward_streak() {
    let app = app();
    complete(&app, day(0));
    let t = app.unlock().unlock_without_reading_on(day(1)).unwrap();
    assert!(t.verse_skipped);
    assert_eq!(t.streak, Some(2));

    let daily = app.unlock().daily_state_on(day(1));
    assert!(daily.devotional_read && !daily.verse_read);
}

#[test]
fn long_run_tracks_longest() {
    let app = app();
    for n in 0..10 {
        complete(&app, day(n));
    }
    for n in 12..15 {
        complete(&app, day(n));
    }
    let record = app.streak().record();
    assert_eq!(record.current_streak, 3);
    assert_eq!(record.longest_streak, 10);
    assert_eq!(record.total_completed_days, 13);
    assert_eq!(record.last_completed_date, Some(day(14)));
}
