use anyhow::{Result, anyhow};
use std::collections::HashMap;

use crate::{
    config::Config,
    error::TimingError,
    model::{Line, NormalizedWord, Slide},
    source::AlignedPayload,
    timing::{
        lines::build_lines,
        slides::build_slides,
        words::{DropCounts, build_api_lines, build_words},
        wrap::wrap_lines,
    },
};

/// Every strategy's output for one song, computed once from its payload.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub words: Vec<NormalizedWord>,
    pub dropped: DropCounts,
    pub rescaled: bool,
    pub lines_word: Vec<Line>,
    pub lines_wrapped: Vec<Line>,
    pub lines_api: Vec<Line>,
    pub slides: Vec<Slide>,
}

impl Prepared {
    pub fn from_payload(payload: &AlignedPayload, cfg: &Config) -> Result<Self, TimingError> {
        let stream = build_words(&payload.words, &payload.meta, &cfg.units)?;

        let lines_word = build_lines(&stream.words, &cfg.grouping);
        let lines_wrapped = wrap_lines(&lines_word, &cfg.wrap);
        let lines_api = build_api_lines(&payload.lines, &payload.meta, &cfg.units);
        let slides = build_slides(&lines_word, &cfg.slides);

        Ok(Self {
            words: stream.words,
            dropped: stream.dropped,
            rescaled: stream.rescaled,
            lines_word,
            lines_wrapped,
            lines_api,
            slides,
        })
    }
}

#[derive(Debug)]
struct Entry {
    /// Input the entry was read from.
    source: String,
    prepared: Prepared,
}

/// Prepared songs by id, kept for the life of the process.
///
/// An entry is only reused for the input it was read from; a different input
/// claiming the same song id replaces it.
#[derive(Debug, Default)]
pub struct SongCache {
    entries: HashMap<String, Entry>,
}

impl SongCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops a song so the next lookup re-fetches its records.
    pub fn invalidate(&mut self, song_id: &str) -> bool {
        self.entries.remove(song_id).is_some()
    }

    /// Returns the cached entry, or fetches and prepares it on a miss.
    pub fn get_or_prepare<F>(
        &mut self,
        song_id: &str,
        source: &str,
        cfg: &Config,
        fetch: F,
    ) -> Result<&Prepared>
    where
        F: FnOnce() -> Result<AlignedPayload>,
    {
        let previous = self.entries.get(song_id).map(|e| e.source.clone());
        if previous.as_deref() == Some(source) {
            tracing::debug!(song_id, source, "song cache hit");
        } else {
            if let Some(previous) = previous {
                tracing::warn!(
                    song_id,
                    previous = previous.as_str(),
                    source,
                    "song id reused by another input; re-preparing"
                );
            }
            let payload = fetch()?;
            let prepared = Prepared::from_payload(&payload, cfg)?;
            tracing::info!(
                song_id,
                source,
                words = prepared.words.len(),
                lines = prepared.lines_word.len(),
                api_lines = prepared.lines_api.len(),
                slides = prepared.slides.len(),
                "song prepared"
            );
            self.entries.insert(
                song_id.to_string(),
                Entry {
                    source: source.to_string(),
                    prepared,
                },
            );
        }

        self.entries
            .get(song_id)
            .map(|e| &e.prepared)
            .ok_or_else(|| anyhow!("song '{song_id}' missing from cache"))
    }
}
