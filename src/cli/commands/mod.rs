//! CLI command implementations.

mod audio;
mod list;
mod run;
mod search;

pub use audio::run_audio;
pub use list::run_list;
pub use run::run_episode;
pub use search::run_search;

use anyhow::Result;
use chrono::NaiveDate;

/// Parse a YYYY-MM-DD argument, defaulting to today's local date.
pub(crate) fn parse_episode_date(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Invalid date '{}', expected YYYY-MM-DD", raw)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_episode_date() {
        let date = parse_episode_date(Some("2026-02-04")).unwrap();
        assert_eq!(date.to_string(), "2026-02-04");
        assert!(parse_episode_date(Some("Feb 4")).is_err());
        assert!(parse_episode_date(None).is_ok());
    }
}
