//! Script templates for episode segments.

use crate::story::Story;
use chrono::NaiveDate;

/// One segment of an episode, in playback order.
///
/// Scripts land on odd sequence numbers and interstitials on even ones so
/// the two interleave when segment files are sorted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Intro,
    /// Story script, numbered from 1.
    Script(usize),
    /// Interstitial between script `n` and script `m`.
    Interstitial(usize, usize),
    Outro,
}

impl Segment {
    /// File stem for this segment's text and WAV outputs.
    pub fn file_stem(&self) -> String {
        match self {
            Segment::Intro => "00_-_intro".to_string(),
            Segment::Script(n) => format!("{:02}_-_script_{:02}", 2 * n - 1, n),
            Segment::Interstitial(n, next) => {
                format!("{:02}_-_interstitial_{:02}_{:02}", 2 * n, n, next)
            }
            Segment::Outro => "20_-_outro".to_string(),
        }
    }
}

/// Spoken form of an episode date.
pub fn format_date_for_speech(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

/// Deterministic script generation for a configured show.
pub struct ScriptWriter {
    show_name: String,
    tagline: String,
}

impl ScriptWriter {
    pub fn new(show_name: &str, tagline: &str) -> Self {
        Self {
            show_name: show_name.to_string(),
            tagline: tagline.to_string(),
        }
    }

    pub fn intro(&self, episode_date: NaiveDate) -> String {
        format!(
            "This is {} — {}. It's {}. Here's what's moving at the edge of AI research today.",
            self.show_name,
            self.tagline,
            format_date_for_speech(episode_date)
        )
    }

    pub fn outro(&self) -> String {
        format!(
            "That wraps {} for today. Stay sharp, stay curious, and we'll see you tomorrow.",
            self.show_name
        )
    }

    /// One short script per story.
    pub fn story_scripts(&self, stories: &[Story]) -> Vec<String> {
        stories
            .iter()
            .enumerate()
            .map(|(idx, story)| format!("Story {}. {}. {}", idx + 1, story.title, story.summary))
            .collect()
    }

    pub fn interstitial(&self, _prev_script: &str, _next_script: &str) -> String {
        "Next up, another signal from the frontier.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{Source, SourceMeta};

    #[test]
    fn test_segment_file_stems() {
        assert_eq!(Segment::Intro.file_stem(), "00_-_intro");
        assert_eq!(Segment::Script(1).file_stem(), "01_-_script_01");
        assert_eq!(Segment::Interstitial(1, 2).file_stem(), "02_-_interstitial_01_02");
        assert_eq!(Segment::Script(2).file_stem(), "03_-_script_02");
        assert_eq!(Segment::Outro.file_stem(), "20_-_outro");
    }

    #[test]
    fn test_segments_sort_in_playback_order() {
        let mut stems = vec![
            Segment::Outro.file_stem(),
            Segment::Script(2).file_stem(),
            Segment::Intro.file_stem(),
            Segment::Interstitial(1, 2).file_stem(),
            Segment::Script(1).file_stem(),
        ];
        stems.sort();
        assert_eq!(
            stems,
            vec![
                "00_-_intro",
                "01_-_script_01",
                "02_-_interstitial_01_02",
                "03_-_script_02",
                "20_-_outro",
            ]
        );
    }

    #[test]
    fn test_intro_speaks_the_date() {
        let writer = ScriptWriter::new("Sende", "daily signals from the AI frontier");
        let intro = writer.intro("2026-02-04".parse().unwrap());
        assert!(intro.contains("Sende"));
        assert!(intro.contains("Wednesday, February 04, 2026"));
    }

    #[test]
    fn test_story_scripts_are_numbered() {
        let writer = ScriptWriter::new("Sende", "tagline");
        let story = Story {
            id: "reddit-x".to_string(),
            title: "Big model drops".to_string(),
            summary: "A short summary".to_string(),
            source_url: "https://example.com".to_string(),
            source_meta: SourceMeta::new(Source::Reddit),
            raw_text: String::new(),
            tags: vec![],
        };
        let scripts = writer.story_scripts(&[story.clone(), story]);
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].starts_with("Story 1."));
        assert!(scripts[1].starts_with("Story 2."));
    }
}
