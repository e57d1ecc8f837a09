//! Audio command implementation.

use super::parse_episode_date;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Synthesize and assemble audio for an existing episode directory.
pub async fn run_audio(date: Option<&str>, settings: Settings) -> Result<()> {
    let episode_date = parse_episode_date(date)?;
    let episode_dir = settings.episodes_dir().join(episode_date.to_string());

    if !episode_dir.exists() {
        anyhow::bail!(
            "No episode directory at {}. Run 'sende run --date {}' first.",
            episode_dir.display(),
            episode_date
        );
    }

    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Generating audio for {}", episode_date));

    let result = orchestrator.generate_audio(&episode_dir).await?;

    Output::success(&format!(
        "Episode audio assembled at {}",
        result.mp3_path.display()
    ));
    Output::kv("Segments synthesized", &result.synthesized.to_string());

    for (name, reason) in &result.failures {
        Output::warning(&format!("Segment {} failed: {}", name, reason));
    }

    Ok(())
}
