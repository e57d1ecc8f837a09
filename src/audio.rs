//! Audio assembly utilities.
//!
//! Stitching and transcoding are stubbed: they record what would be
//! produced instead of invoking an audio toolchain.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stub: write a manifest listing the WAV inputs next to the output path.
pub fn stitch_wavs(
    wav_files: &[PathBuf],
    output_path: &Path,
    silence_seconds: f64,
) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manifest_path = output_path.with_extension("manifest.txt");
    let mut lines: Vec<String> = wav_files.iter().map(|p| p.display().to_string()).collect();
    lines.push(format!("silence_seconds={}", silence_seconds));
    std::fs::write(&manifest_path, lines.join("\n"))?;

    info!("Stitch manifest written for {} inputs", wav_files.len());
    Ok(output_path.to_path_buf())
}

/// Stub: write a marker file for the MP3 output.
pub fn transcode_to_mp3(wav_path: &Path, mp3_path: &Path, bitrate: &str) -> Result<PathBuf> {
    if let Some(parent) = mp3_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        mp3_path,
        format!("stub mp3 from {} at {}", wav_path.display(), bitrate),
    )?;
    Ok(mp3_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stitch_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let wavs = vec![dir.path().join("a.wav"), dir.path().join("b.wav")];
        let output = dir.path().join("episode.wav");

        let result = stitch_wavs(&wavs, &output, 1.0).unwrap();
        assert_eq!(result, output);

        let manifest = std::fs::read_to_string(dir.path().join("episode.manifest.txt")).unwrap();
        assert!(manifest.contains("a.wav"));
        assert!(manifest.contains("silence_seconds=1"));
    }

    #[test]
    fn test_transcode_writes_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mp3 = dir.path().join("episode.mp3");

        transcode_to_mp3(&dir.path().join("episode.wav"), &mp3, "128k").unwrap();
        let marker = std::fs::read_to_string(&mp3).unwrap();
        assert!(marker.contains("128k"));
    }
}
