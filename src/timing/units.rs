//! Best-guess (start, end) extraction from records of unknown unit.
//!
//! Rules are tried in confidence order: explicit units first, then inferred
//! units, then magnitude-guessed units, then a per-side fallback.

use serde_json::Value;

use crate::{
    error::TimingError,
    model::{RawRecord, SourceMeta},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeUnit {
    Seconds,
    Samples,
    Milliseconds,
    /// No unit in the field name; decided by magnitude.
    Generic,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub unit: TimeUnit,
    pub start: &'static [&'static str],
    pub end: &'static [&'static str],
}

pub const SECONDS_RULE: FieldRule = FieldRule {
    unit: TimeUnit::Seconds,
    start: &["start_s", "startS", "s", "begin_s"],
    end: &["end_s", "endS", "e", "finish_s"],
};

pub const SAMPLES_RULE: FieldRule = FieldRule {
    unit: TimeUnit::Samples,
    start: &["start_sample", "sample_start", "startFrame"],
    end: &["end_sample", "sample_end", "endFrame"],
};

pub const MILLIS_RULE: FieldRule = FieldRule {
    unit: TimeUnit::Milliseconds,
    start: &["start_ms", "startMs", "ms_start"],
    end: &["end_ms", "endMs", "ms_end"],
};

pub const GENERIC_RULE: FieldRule = FieldRule {
    unit: TimeUnit::Generic,
    start: &["start", "begin", "t0"],
    end: &["end", "finish", "t1"],
};

/// Pair rules in the order they are trusted.
pub const PAIR_RULES: [FieldRule; 4] = [SECONDS_RULE, SAMPLES_RULE, MILLIS_RULE, GENERIC_RULE];

/// Single-side fallback order when no rule yields a full pair.
const FALLBACK_RULES: [FieldRule; 4] = [SECONDS_RULE, GENERIC_RULE, SAMPLES_RULE, MILLIS_RULE];

pub const SAMPLE_RATE_KEYS: [&str; 3] = ["sample_rate", "sampleRate", "audio_sample_rate"];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

/// Which rule produced a span. Exposed for the timing analysis report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    Pair(TimeUnit),
    /// Generic pair that crossed the ceiling and was read as milliseconds.
    GenericAsMillis,
    Fallback,
}

/// Finite number from a JSON number or numeric string.
pub fn numeric(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn pick(record: &RawRecord, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| record.get(k).and_then(numeric))
}

pub fn sample_rate_from(obj: &serde_json::Map<String, Value>) -> Option<f64> {
    SAMPLE_RATE_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(numeric))
        .filter(|sr| *sr > 0.0)
}

fn side(record: &RawRecord, rule: &FieldRule, keys: &[&str], meta: &SourceMeta) -> Option<f64> {
    let raw = pick(record, keys)?;
    match rule.unit {
        TimeUnit::Seconds | TimeUnit::Generic => Some(raw),
        TimeUnit::Milliseconds => Some(raw / 1000.0),
        TimeUnit::Samples => {
            let sr = meta.sample_rate.filter(|sr| *sr > 0.0)?;
            Some(raw / sr)
        }
    }
}

fn apply_pair_rule(
    record: &RawRecord,
    rule: &FieldRule,
    meta: &SourceMeta,
    seconds_ceiling: f64,
) -> Option<(Span, Resolution)> {
    let start = side(record, rule, rule.start, meta)?;
    let end = side(record, rule, rule.end, meta)?;

    if rule.unit == TimeUnit::Generic && start.max(end) > seconds_ceiling {
        let span = Span {
            start: start / 1000.0,
            end: end / 1000.0,
        };
        return Some((span, Resolution::GenericAsMillis));
    }

    Some((Span { start, end }, Resolution::Pair(rule.unit)))
}

/// Resolves a record's span and reports which rule decided it.
pub fn resolve(
    record: &RawRecord,
    meta: &SourceMeta,
    seconds_ceiling: f64,
) -> Result<(Span, Resolution), TimingError> {
    if let Some(hit) = PAIR_RULES
        .iter()
        .find_map(|rule| apply_pair_rule(record, rule, meta, seconds_ceiling))
    {
        return Ok(hit);
    }

    let start = FALLBACK_RULES
        .iter()
        .find_map(|rule| side(record, rule, rule.start, meta));
    let end = FALLBACK_RULES
        .iter()
        .find_map(|rule| side(record, rule, rule.end, meta));

    match (start, end) {
        (Some(start), Some(end)) => Ok((Span { start, end }, Resolution::Fallback)),
        _ => Err(TimingError::Unresolvable),
    }
}

pub fn normalize(
    record: &RawRecord,
    meta: &SourceMeta,
    seconds_ceiling: f64,
) -> Result<Span, TimingError> {
    resolve(record, meta, seconds_ceiling).map(|(span, _)| span)
}
