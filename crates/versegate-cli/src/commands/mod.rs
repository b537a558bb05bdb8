pub mod config;
pub mod onboarding;
pub mod read;
pub mod schedule;
pub mod select;
pub mod status;
pub mod streak;
pub mod trigger;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use versegate_core::{App, Config};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the shared store with the on-disk configuration.
pub fn open_app() -> Result<App, Box<dyn std::error::Error>> {
    Ok(App::open(Config::load_or_default())?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a local date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Parse a local wall-clock time (`YYYY-MM-DDTHH:MM[:SS]`).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM: {e}"))
}

pub fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

pub fn now_or(at: Option<NaiveDateTime>) -> NaiveDateTime {
    at.unwrap_or_else(|| Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds() {
        let a = parse_datetime("2024-05-01T14:37").unwrap();
        let b = parse_datetime("2024-05-01T14:37:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("14:37").is_err());
    }

    #[test]
    fn parses_dates() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(parse_date("2023-02-29").is_err());
    }
}
