use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One word or line record exactly as the data source supplied it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Display text of the record: `word` when it is a string, else `text`.
    pub fn raw_text(&self) -> &str {
        match self.0.get("word") {
            Some(Value::String(s)) => s.as_str(),
            _ => self.line_text(),
        }
    }

    /// Display text of a line-level record, which only ever reads `text`.
    pub fn line_text(&self) -> &str {
        self.0.get("text").and_then(Value::as_str).unwrap_or("")
    }
}

impl From<Value> for RawRecord {
    fn from(v: Value) -> Self {
        match v {
            Value::Object(m) => RawRecord(m),
            _ => RawRecord::default(),
        }
    }
}

/// Collection-level metadata travelling with a batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub sample_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWord {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl NormalizedWord {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// A display line. `char_ends[i]` is revealed at `times[i]`; offsets are in chars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub char_ends: Vec<usize>,
    pub times: Vec<f64>,
}

impl Line {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub lines: Vec<Line>,
}

impl Slide {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The slide as one line whose reveal points are its member line ends.
    pub fn as_line(&self) -> Line {
        let mut char_ends = Vec::with_capacity(self.lines.len());
        let mut times = Vec::with_capacity(self.lines.len());
        let mut cursor = 0usize;
        let mut reveal = f64::NEG_INFINITY;
        for (i, l) in self.lines.iter().enumerate() {
            if i > 0 {
                cursor += 1;
            }
            cursor += l.char_len();
            char_ends.push(cursor);
            reveal = reveal.max(l.end);
            times.push(reveal);
        }
        Line {
            start: self.start,
            end: self.end,
            text: self.text(),
            char_ends,
            times,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSchedule {
    pub keyframes: Vec<Keyframe>,
}

/// One exported display unit: a single line or a whole slide.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedUnit {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub lines: Vec<Line>,
    pub line_schedules: Vec<KeyframeSchedule>,
    pub schedule: KeyframeSchedule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub song_id: String,
    pub strategy: &'static str,
    pub highlight_chunk: usize,
    pub offset: f64,
    pub units: Vec<TimedUnit>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.units.last().map(|u| u.end).unwrap_or(0.0).max(0.0)
    }
}
