use crate::{
    config::UnitsCfg,
    error::TimingError,
    model::{Line, NormalizedWord, RawRecord, SourceMeta},
    timing::{clean::clean_text, units},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub unresolvable: usize,
    pub empty_text: usize,
    pub degenerate: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.unresolvable + self.empty_text + self.degenerate
    }

    fn record(&mut self, err: &TimingError) {
        match err {
            TimingError::Unresolvable => self.unresolvable += 1,
            TimingError::EmptyAfterCleaning => self.empty_text += 1,
            TimingError::DegenerateSpan { .. } => self.degenerate += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordStream {
    pub words: Vec<NormalizedWord>,
    pub dropped: DropCounts,
    /// The whole stream was divided by 1000 after the per-record pass.
    pub rescaled: bool,
}

/// Picks the display text out of a record.
type TextOf = fn(&RawRecord) -> &str;

fn normalize_record(
    idx: usize,
    record: &RawRecord,
    text_of: TextOf,
    meta: &SourceMeta,
    cfg: &UnitsCfg,
) -> Result<NormalizedWord, TimingError> {
    let span = units::normalize(record, meta, cfg.seconds_ceiling)?;
    if span.start < 0.0 || span.end <= span.start {
        return Err(TimingError::DegenerateSpan {
            start: span.start,
            end: span.end,
        });
    }

    let text = clean_text(text_of(record));
    if text.is_empty() {
        return Err(TimingError::EmptyAfterCleaning);
    }

    tracing::trace!(idx, start = span.start, end = span.end, "record normalized");
    Ok(NormalizedWord {
        start: span.start,
        end: span.end,
        text,
    })
}

fn collect_normalized(
    records: &[RawRecord],
    text_of: TextOf,
    meta: &SourceMeta,
    cfg: &UnitsCfg,
) -> (Vec<NormalizedWord>, DropCounts) {
    let mut dropped = DropCounts::default();
    let mut out = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        match normalize_record(idx, record, text_of, meta, cfg) {
            Ok(w) => out.push(w),
            Err(err) => {
                tracing::debug!(idx, reason = %err, "record dropped");
                dropped.record(&err);
            }
        }
    }

    (out, dropped)
}

fn max_end<'a>(ends: impl Iterator<Item = &'a f64>) -> f64 {
    ends.copied().fold(0.0, f64::max)
}

/// Sorted, normalized words with drop accounting, or `NoUsableRecords` when
/// nothing survives.
pub fn build_words(
    records: &[RawRecord],
    meta: &SourceMeta,
    cfg: &UnitsCfg,
) -> Result<WordStream, TimingError> {
    let (mut words, dropped) = collect_normalized(records, RawRecord::raw_text, meta, cfg);

    let rescaled = max_end(words.iter().map(|w| &w.end)) > cfg.seconds_ceiling;
    if rescaled {
        tracing::info!(
            ceiling = cfg.seconds_ceiling,
            "word times still look like milliseconds; rescaling stream"
        );
        for w in &mut words {
            w.start /= 1000.0;
            w.end /= 1000.0;
        }
    }

    words.sort_by(|a, b| a.start.total_cmp(&b.start));

    tracing::info!(
        records = records.len(),
        words = words.len(),
        dropped = dropped.total(),
        unresolvable = dropped.unresolvable,
        empty_text = dropped.empty_text,
        degenerate = dropped.degenerate,
        "word stream built"
    );

    if words.is_empty() {
        return Err(TimingError::NoUsableRecords);
    }

    Ok(WordStream {
        words,
        dropped,
        rescaled,
    })
}

/// Takes the source's own line records as display lines, one reveal step each.
pub fn build_api_lines(records: &[RawRecord], meta: &SourceMeta, cfg: &UnitsCfg) -> Vec<Line> {
    let (items, dropped) = collect_normalized(records, RawRecord::line_text, meta, cfg);

    let mut lines: Vec<Line> = items
        .into_iter()
        .map(|w| {
            let n = w.text.chars().count();
            Line {
                start: w.start,
                end: w.end,
                text: w.text,
                char_ends: vec![n],
                times: vec![w.end],
            }
        })
        .collect();

    if max_end(lines.iter().map(|l| &l.end)) > cfg.seconds_ceiling {
        for l in &mut lines {
            l.start /= 1000.0;
            l.end /= 1000.0;
            for t in &mut l.times {
                *t /= 1000.0;
            }
        }
    }

    lines.sort_by(|a, b| a.start.total_cmp(&b.start));

    tracing::info!(
        records = records.len(),
        lines = lines.len(),
        dropped = dropped.total(),
        "source lines built"
    );

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn records(v: Value) -> Vec<RawRecord> {
        v.as_array()
            .unwrap()
            .iter()
            .cloned()
            .map(RawRecord::from)
            .collect()
    }

    fn word(start: f64, end: f64, text: &str) -> NormalizedWord {
        NormalizedWord {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn drops_bad_records_and_sorts() {
        let recs = records(json!([
            {"start_s": 2.0, "end_s": 2.5, "word": "second"},
            {"start_s": 0.5, "end_s": 1.0, "word": "[Intro] first"},
            {"word": "no times"},
            {"start_s": 3.0, "end_s": 3.5, "word": "[Chorus]"},
            {"start_s": 4.0, "end_s": 3.0, "word": "backwards"},
        ]));
        let stream = build_words(&recs, &SourceMeta::default(), &UnitsCfg::default()).unwrap();
        assert_eq!(
            stream.words,
            vec![word(0.5, 1.0, "first"), word(2.0, 2.5, "second")]
        );
        assert_eq!(
            stream.dropped,
            DropCounts {
                unresolvable: 1,
                empty_text: 1,
                degenerate: 1
            }
        );
        assert!(!stream.rescaled);
    }

    #[test]
    fn global_rescale_catches_locally_small_millis() {
        // Each pair is below the ceiling on its own, but the song clearly is not.
        let recs = records(json!([
            {"start_s": 100, "end_s": 400, "word": "a"},
            {"start_s": 120000, "end_s": 120500, "word": "b"},
        ]));
        let stream = build_words(&recs, &SourceMeta::default(), &UnitsCfg::default()).unwrap();
        assert!(stream.rescaled);
        assert_eq!(stream.words, vec![word(0.1, 0.4, "a"), word(120.0, 120.5, "b")]);
    }

    #[test]
    fn empty_batch_is_terminal() {
        let recs = records(json!([{"word": "[Verse]", "start_s": 0, "end_s": 1}]));
        assert_eq!(
            build_words(&recs, &SourceMeta::default(), &UnitsCfg::default()),
            Err(TimingError::NoUsableRecords)
        );
        assert_eq!(
            build_words(&[], &SourceMeta::default(), &UnitsCfg::default()),
            Err(TimingError::NoUsableRecords)
        );
    }

    #[test]
    fn sample_indices_use_meta_rate() {
        let recs = records(json!([{"start_sample": 48000, "end_sample": 96000, "text": "hey"}]));
        let meta = SourceMeta {
            sample_rate: Some(48000.0),
        };
        let stream = build_words(&recs, &meta, &UnitsCfg::default()).unwrap();
        assert_eq!(stream.words, vec![word(1.0, 2.0, "hey")]);
    }

    #[test]
    fn api_lines_get_single_reveal_step() {
        let recs = records(json!([
            {"start": 5000, "end": 9000, "text": "[Verse] second line"},
            {"start": 1000, "end": 4000, "text": "first line"},
            {"start": 1, "end": 2, "text": "[Bridge]"},
        ]));
        let lines = build_api_lines(&recs, &SourceMeta::default(), &UnitsCfg::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "first line");
        assert_eq!((lines[0].start, lines[0].end), (1.0, 4.0));
        assert_eq!(lines[0].char_ends, vec![10]);
        assert_eq!(lines[0].times, vec![4.0]);
        assert_eq!(lines[1].text, "second line");
    }

    #[test]
    fn api_lines_read_text_not_word() {
        let recs = records(json!([
            {"start_s": 1.0, "end_s": 2.0, "word": "first", "text": "first whole line"},
        ]));
        let lines = build_api_lines(&recs, &SourceMeta::default(), &UnitsCfg::default());
        assert_eq!(lines[0].text, "first whole line");
        assert_eq!(lines[0].char_ends, vec![16]);
    }

    #[test]
    fn api_lines_rescale_times_too() {
        let recs = records(json!([
            {"start_s": 500, "end_s": 599, "text": "x"},
            {"start_s": 700000, "end_s": 701000, "text": "y"},
        ]));
        let lines = build_api_lines(&recs, &SourceMeta::default(), &UnitsCfg::default());
        assert_eq!(lines[1].times, vec![701.0]);
        assert_eq!(lines[0].end, 0.599);
    }
}
