use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    formats::time::round_ms,
    model::{Keyframe, KeyframeSchedule, Line, TimedUnit, Timeline},
};

pub const SCHEMA: &str = "lyricsync.timeline";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedJson {
    pub schema: String,
    pub version: u32,
    pub song_id: String,
    pub strategy: String,
    pub highlight_chunk: usize,
    pub offset: f64,
    pub units: Vec<JsonUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonUnit {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub keyframes: Vec<JsonKeyframe>,
    pub interpolation: String,
    pub lines: Vec<JsonLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub char_ends: Vec<usize>,
    pub times: Vec<f64>,
    pub keyframes: Vec<JsonKeyframe>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JsonKeyframe {
    pub time: f64,
    pub percent: f64,
}

impl From<&Keyframe> for JsonKeyframe {
    fn from(k: &Keyframe) -> Self {
        Self {
            time: round_ms(k.time),
            percent: round_ms(k.percent),
        }
    }
}

fn encode_schedule(s: &KeyframeSchedule) -> Vec<JsonKeyframe> {
    s.keyframes.iter().map(JsonKeyframe::from).collect()
}

fn encode_line(l: &Line, schedule: Option<&KeyframeSchedule>) -> JsonLine {
    JsonLine {
        start: round_ms(l.start),
        end: round_ms(l.end),
        text: l.text.clone(),
        char_ends: l.char_ends.clone(),
        times: l.times.iter().copied().map(round_ms).collect(),
        keyframes: schedule.map(encode_schedule).unwrap_or_default(),
    }
}

fn encode_unit(u: &TimedUnit) -> JsonUnit {
    JsonUnit {
        index: u.index,
        start: round_ms(u.start),
        end: round_ms(u.end),
        text: u.text.clone(),
        keyframes: encode_schedule(&u.schedule),
        interpolation: "hold".to_string(),
        lines: u
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| encode_line(l, u.line_schedules.get(i)))
            .collect(),
    }
}

pub fn write_json(t: &Timeline, wrapped: bool) -> Result<String> {
    let units: Vec<JsonUnit> = t.units.iter().map(encode_unit).collect();

    if wrapped {
        let w = WrappedJson {
            schema: SCHEMA.to_string(),
            version: 1,
            song_id: t.song_id.clone(),
            strategy: t.strategy.to_string(),
            highlight_chunk: t.highlight_chunk,
            offset: t.offset,
            units,
        };
        Ok(serde_json::to_string_pretty(&w)?)
    } else {
        Ok(serde_json::to_string_pretty(&units)?)
    }
}
