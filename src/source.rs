use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::{fs, io::Read, path::Path};

use crate::{
    model::{RawRecord, SourceMeta},
    timing::units::sample_rate_from,
};

/// Records for one song as handed over by the retrieval side.
#[derive(Debug, Clone, Default)]
pub struct AlignedPayload {
    /// Word-level records; the line records when the source has no words.
    pub words: Vec<RawRecord>,
    pub lines: Vec<RawRecord>,
    pub meta: SourceMeta,
    pub has_aligned_words: bool,
    pub has_aligned_lyrics: bool,
    /// Untouched document, kept for the analysis report.
    pub raw: Value,
}

fn records_of(v: Option<&Value>) -> Option<Vec<RawRecord>> {
    let arr = v?.as_array()?;
    Some(arr.iter().cloned().map(RawRecord::from).collect())
}

pub fn parse_payload(input: &str) -> Result<AlignedPayload> {
    let v: Value = serde_json::from_str(input).context("input is not valid JSON")?;

    if v.is_array() {
        let words = records_of(Some(&v)).unwrap_or_default();
        return Ok(AlignedPayload {
            words,
            lines: Vec::new(),
            meta: SourceMeta::default(),
            has_aligned_words: true,
            has_aligned_lyrics: false,
            raw: v,
        });
    }

    let obj = v
        .as_object()
        .ok_or_else(|| anyhow!("payload must be a JSON object or array"))?;

    let aligned_words = records_of(obj.get("aligned_words"));
    let aligned_lyrics = records_of(obj.get("aligned_lyrics"));
    if aligned_words.is_none() && aligned_lyrics.is_none() {
        return Err(anyhow!(
            "payload has neither 'aligned_words' nor 'aligned_lyrics' arrays"
        ));
    }

    let meta = SourceMeta {
        sample_rate: sample_rate_from(obj),
    };
    let has_aligned_words = aligned_words.is_some();
    let has_aligned_lyrics = aligned_lyrics.is_some();
    let lines = aligned_lyrics.unwrap_or_default();
    let words = aligned_words.unwrap_or_else(|| lines.clone());

    Ok(AlignedPayload {
        words,
        lines,
        meta,
        has_aligned_words,
        has_aligned_lyrics,
        raw: v,
    })
}

pub fn read_input_to_string(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed reading input: {input}"))
    }
}

pub fn load_payload(input: &str) -> Result<AlignedPayload> {
    let raw = read_input_to_string(input)?;
    tracing::info!(input, bytes = raw.len(), "read input");
    parse_payload(&raw).with_context(|| format!("failed parsing payload: {input}"))
}

/// Song id for an input: its file stem, or `stdin` for `-`.
pub fn song_id_for(input: &str) -> String {
    if input == "-" {
        return "stdin".to_string();
    }
    Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("song")
        .to_string()
}
