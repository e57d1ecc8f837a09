//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Show archive contents.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let store = match orchestrator.open_store() {
        Ok(store) => store,
        Err(e) => {
            Output::error(&format!("Archive unavailable: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    };

    let story_count = store.story_count()?;
    let episodes = store.list_episodes()?;

    if story_count == 0 && episodes.is_empty() {
        Output::info("Archive is empty. Use 'sende run' to assemble an episode.");
        return Ok(());
    }

    Output::header(&format!("Episodes ({})", episodes.len()));
    for episode in &episodes {
        Output::list_item(&format!(
            "{} ({} stories, generated {})",
            episode.episode_date, episode.story_count, episode.generated_at
        ));
    }

    println!();
    Output::kv("Stored stories", &story_count.to_string());
    Output::kv("Stored episodes", &episodes.len().to_string());

    Ok(())
}
