//! Episode output files.
//!
//! One directory per episode date holding per-segment text files, the
//! concatenated episode text, a manifest, and publishing companions
//! (plain transcript, chapter markers).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const EPISODE_FILE: &str = "episode.txt";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const TRANSCRIPT_FILE: &str = "transcript.txt";
pub const CHAPTERS_FILE: &str = "chapters.json";

/// Manifest describing one assembled episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeManifest {
    pub episode_date: String,
    pub story_count: usize,
    pub segments: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Chapters {
    chapters: Vec<Chapter>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Chapter {
    title: String,
    start: u64,
}

/// Write per-segment text files plus the concatenated episode text.
/// Returns the full episode text.
pub fn write_episode_outputs(episode_dir: &Path, segments: &[(String, String)]) -> Result<String> {
    std::fs::create_dir_all(episode_dir)?;

    let mut parts: Vec<&str> = Vec::with_capacity(segments.len());
    for (name, text) in segments {
        std::fs::write(episode_dir.join(format!("{}.txt", name)), text)?;
        parts.push(text.as_str());
    }

    let episode_text = parts.join("\n\n");
    std::fs::write(episode_dir.join(EPISODE_FILE), &episode_text)?;
    Ok(episode_text)
}

/// Write the episode manifest.
pub fn write_manifest(episode_dir: &Path, manifest: &EpisodeManifest) -> Result<()> {
    std::fs::create_dir_all(episode_dir)?;
    let content = serde_json::to_string_pretty(manifest)?;
    std::fs::write(episode_dir.join(MANIFEST_FILE), content)?;
    Ok(())
}

/// Read back segment files for audio generation, in name order, skipping
/// the combined episode text and other non-segment files.
pub fn read_segments(episode_dir: &Path) -> Result<Vec<(String, String)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(episode_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
        .collect();
    paths.sort();

    let mut segments = Vec::new();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem == "episode" || stem == "transcript" {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        segments.push((stem.to_string(), text));
    }
    Ok(segments)
}

/// Write the plain transcript used for show notes.
pub fn write_transcript(episode_dir: &Path, episode_text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(episode_dir)?;
    let path = episode_dir.join(TRANSCRIPT_FILE);
    std::fs::write(&path, episode_text)?;
    Ok(path)
}

/// Write chapter markers, one entry per segment.
///
/// Start offsets stay at zero until real audio durations exist to fill
/// them in.
pub fn write_chapters(episode_dir: &Path, segment_names: &[String]) -> Result<PathBuf> {
    std::fs::create_dir_all(episode_dir)?;
    let chapters = Chapters {
        chapters: segment_names
            .iter()
            .map(|name| Chapter {
                title: name.clone(),
                start: 0,
            })
            .collect(),
    };
    let path = episode_dir.join(CHAPTERS_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&chapters)?)?;
    Ok(path)
}
