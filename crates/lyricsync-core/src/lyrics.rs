use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A single timed lyric line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    pub timestamp_ms: u64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl LyricLine {
    pub fn new(timestamp_ms: u64, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            text: text.into(),
            translation: None,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }
}

/// Lyrics for one track. Immutable once built; replaced wholesale on track change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLyrics {
    pub lines: Vec<LyricLine>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ParsedLyrics {
    /// Build from lines, stable-sorting them by timestamp
    pub fn new(mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by_key(|line| line.timestamp_ms);
        Self {
            lines,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Evenly spaced lines, handy for tests and demos
    pub fn uniform(count: usize, spacing_ms: u64) -> Self {
        Self::new(
            (0..count)
                .map(|i| LyricLine::new(i as u64 * spacing_ms, format!("line {}", i + 1)))
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = u64> + '_ {
        self.lines.iter().map(|line| line.timestamp_ms)
    }
}

/// Read contract of the lyric-loading subsystem
#[async_trait::async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Parsed lyrics for a track, or `None` when the track has none
    async fn get_parsed_lyrics(&self, track_id: &str) -> Result<Option<ParsedLyrics>>;
}

/// In-memory provider keyed by track id
#[derive(Debug, Clone, Default)]
pub struct StaticLyricsProvider {
    tracks: Arc<RwLock<HashMap<String, Arc<ParsedLyrics>>>>,
}

impl StaticLyricsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, track_id: impl Into<String>, lyrics: ParsedLyrics) {
        self.tracks.write().insert(track_id.into(), Arc::new(lyrics));
    }

    pub fn remove(&self, track_id: &str) -> bool {
        self.tracks.write().remove(track_id).is_some()
    }
}

#[async_trait::async_trait]
impl LyricsProvider for StaticLyricsProvider {
    async fn get_parsed_lyrics(&self, track_id: &str) -> Result<Option<ParsedLyrics>> {
        Ok(self
            .tracks
            .read()
            .get(track_id)
            .map(|lyrics| ParsedLyrics::clone(lyrics)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_stably() {
        let lyrics = ParsedLyrics::new(vec![
            LyricLine::new(3000, "c"),
            LyricLine::new(0, "a"),
            LyricLine::new(3000, "d"),
            LyricLine::new(1000, "b"),
        ]);
        let texts: Vec<_> = lyrics.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_uniform() {
        let lyrics = ParsedLyrics::uniform(4, 3000);
        assert_eq!(lyrics.timestamps().collect::<Vec<_>>(), [0, 3000, 6000, 9000]);
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticLyricsProvider::new();
        provider.insert("t1", ParsedLyrics::uniform(2, 1000).with_metadata("ti", "Song"));

        let found = provider.get_parsed_lyrics("t1").await.unwrap().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.metadata.get("ti").map(String::as_str), Some("Song"));

        assert!(provider.get_parsed_lyrics("missing").await.unwrap().is_none());
        assert!(provider.remove("t1"));
        assert!(provider.get_parsed_lyrics("t1").await.unwrap().is_none());
    }
}
