use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    cache::Prepared,
    config::Config,
    source::AlignedPayload,
    timing::units::{self, Resolution, TimeUnit},
};

#[derive(Debug, Clone, Serialize)]
pub struct TimingReport {
    pub song_id: String,
    pub detected_fields: DetectedFields,
    pub resolutions: BTreeMap<&'static str, usize>,
    pub timing_stats: TimingStats,
    pub strategies: BTreeMap<&'static str, usize>,
    pub sample_records: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectedFields {
    pub has_aligned_words: bool,
    pub has_aligned_lyrics: bool,
    pub sample_rate: Option<f64>,
    pub top_level_keys: Vec<String>,
    pub first_item_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingStats {
    pub records: usize,
    pub total_words: usize,
    pub dropped_unresolvable: usize,
    pub dropped_empty_text: usize,
    pub dropped_degenerate: usize,
    pub max_start: f64,
    pub max_end: f64,
    pub avg_duration: f64,
    /// Unit the stream was read in before any global rescale.
    pub suspected_unit: &'static str,
    pub rescaled: bool,
}

fn resolution_label(r: Resolution) -> &'static str {
    match r {
        Resolution::Pair(TimeUnit::Seconds) => "seconds",
        Resolution::Pair(TimeUnit::Samples) => "samples",
        Resolution::Pair(TimeUnit::Milliseconds) => "milliseconds",
        Resolution::Pair(TimeUnit::Generic) => "generic_as_seconds",
        Resolution::GenericAsMillis => "generic_as_milliseconds",
        Resolution::Fallback => "fallback",
    }
}

pub fn analyze(
    song_id: &str,
    payload: &AlignedPayload,
    prepared: &Prepared,
    cfg: &Config,
    samples: usize,
) -> TimingReport {
    let mut resolutions: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in &payload.words {
        let label = match units::resolve(record, &payload.meta, cfg.units.seconds_ceiling) {
            Ok((_, r)) => resolution_label(r),
            Err(_) => "unresolvable",
        };
        *resolutions.entry(label).or_default() += 1;
    }

    let words = &prepared.words;
    let max_start = words.iter().map(|w| w.start).fold(0.0, f64::max);
    let max_end = words.iter().map(|w| w.end).fold(0.0, f64::max);
    let avg_duration = if words.is_empty() {
        0.0
    } else {
        words.iter().map(|w| w.duration()).sum::<f64>() / words.len() as f64
    };

    let timing_stats = TimingStats {
        records: payload.words.len(),
        total_words: words.len(),
        dropped_unresolvable: prepared.dropped.unresolvable,
        dropped_empty_text: prepared.dropped.empty_text,
        dropped_degenerate: prepared.dropped.degenerate,
        max_start,
        max_end,
        avg_duration,
        suspected_unit: if prepared.rescaled {
            "milliseconds"
        } else {
            "seconds"
        },
        rescaled: prepared.rescaled,
    };

    let strategies = BTreeMap::from([
        ("word", prepared.lines_word.len()),
        ("api", prepared.lines_api.len()),
        ("word-wrap", prepared.lines_wrapped.len()),
        ("slides", prepared.slides.len()),
    ]);

    let first_item_keys = payload
        .words
        .first()
        .map(|r| r.0.keys().cloned().collect())
        .unwrap_or_default();

    let top_level_keys = payload
        .raw
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();

    TimingReport {
        song_id: song_id.to_string(),
        detected_fields: DetectedFields {
            has_aligned_words: payload.has_aligned_words,
            has_aligned_lyrics: payload.has_aligned_lyrics,
            sample_rate: payload.meta.sample_rate,
            top_level_keys,
            first_item_keys,
        },
        resolutions,
        timing_stats,
        strategies,
        sample_records: payload
            .words
            .iter()
            .take(samples)
            .map(|r| Value::Object(r.0.clone()))
            .collect(),
    }
}
