//! Run command implementation.

use super::parse_episode_date;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, StorageOutcome};
use anyhow::Result;

/// Run the episode assembly pipeline.
pub async fn run_episode(
    date: Option<&str>,
    live: bool,
    no_store: bool,
    settings: Settings,
) -> Result<()> {
    let episode_date = parse_episode_date(date)?;
    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!(
        "Assembling episode for {} ({} sources)",
        episode_date,
        if live { "live" } else { "stubbed" }
    ));

    let result = orchestrator.run_episode(episode_date, live, !no_store).await?;

    Output::success(&format!(
        "Episode written to {}",
        result.episode_dir.display()
    ));
    Output::kv("Stories", &result.story_count.to_string());
    Output::kv("Segments", &result.segment_count.to_string());

    match result.storage {
        StorageOutcome::Primary(outcome) => {
            Output::kv("Archived (new)", &outcome.inserted.to_string());
            Output::kv("Marked used", &outcome.updated.to_string());
            Output::kv("Unchanged", &outcome.skipped.to_string());
        }
        StorageOutcome::Fallback => {
            Output::warning("Vector store unavailable; stories written to flat-file fallback");
        }
        StorageOutcome::Skipped => {
            Output::info("Storage skipped (--no-store)");
        }
    }

    Ok(())
}
