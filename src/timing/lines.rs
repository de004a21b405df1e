//! Greedy word → line grouping.
//!
//! One left-to-right pass; a cut is never revisited.

use crate::{
    config::GroupingCfg,
    model::{Line, NormalizedWord},
};

const ATTACHED_PUNCT: &[char] = &['.', ',', '!', '?', ':', ';', '…', ')', ']', '}'];
const SENTENCE_END: &[char] = &['.', '!', '?', '…'];

/// Share of the gap threshold that already splits after a finished sentence.
const SENTENCE_GAP_FACTOR: f64 = 0.6;

/// Token made only of closing punctuation; glued to the previous word.
pub fn is_punct_token(tok: &str) -> bool {
    !tok.is_empty() && tok.chars().all(|c| ATTACHED_PUNCT.contains(&c))
}

fn ends_sentence(tok: &str) -> bool {
    tok.ends_with(SENTENCE_END)
}

struct Joined {
    text: String,
    char_ends: Vec<usize>,
    times: Vec<f64>,
}

fn join_words(chunk: &[NormalizedWord]) -> Joined {
    let mut text = String::new();
    let mut len = 0usize;
    let mut char_ends = Vec::with_capacity(chunk.len());
    let mut times = Vec::with_capacity(chunk.len());
    let mut reveal = f64::NEG_INFINITY;

    for (i, w) in chunk.iter().enumerate() {
        if i > 0 && !is_punct_token(&w.text) {
            text.push(' ');
            len += 1;
        }
        text.push_str(&w.text);
        len += w.text.chars().count();
        char_ends.push(len);
        // Overlapping words can end earlier than their predecessor.
        reveal = reveal.max(w.end);
        times.push(reveal);
    }

    Joined {
        text,
        char_ends,
        times,
    }
}

/// Char length the chunk would have with `next` appended.
fn joined_len_with(chunk_len: usize, next: &NormalizedWord) -> usize {
    let sep = usize::from(!is_punct_token(&next.text));
    chunk_len + sep + next.text.chars().count()
}

fn make_line(chunk: &[NormalizedWord]) -> Option<Line> {
    let first = chunk.first()?;
    let last = chunk.last()?;
    let j = join_words(chunk);
    Some(Line {
        start: first.start,
        end: last.end,
        text: j.text,
        char_ends: j.char_ends,
        times: j.times,
    })
}

fn should_cut(
    chunk: &[NormalizedWord],
    chunk_len: usize,
    next: &NormalizedWord,
    cfg: &GroupingCfg,
) -> bool {
    let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
        return false;
    };

    let gap = (next.start - last.end).max(0.0);
    let duration = next.end - first.start;

    gap > cfg.gap_break_s
        || duration > cfg.max_line_duration_s
        || joined_len_with(chunk_len, next) > cfg.max_chars
        || chunk.len() >= cfg.max_words
        || (ends_sentence(&last.text) && gap > cfg.gap_break_s * SENTENCE_GAP_FACTOR)
}

pub fn build_lines(words: &[NormalizedWord], cfg: &GroupingCfg) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut chunk: Vec<NormalizedWord> = Vec::new();
    let mut chunk_len = 0usize;

    for w in words {
        if !chunk.is_empty() && should_cut(&chunk, chunk_len, w, cfg) {
            lines.extend(make_line(&chunk));
            chunk.clear();
        }

        chunk_len = if chunk.is_empty() {
            w.text.chars().count()
        } else {
            joined_len_with(chunk_len, w)
        };
        chunk.push(w.clone());
    }
    lines.extend(make_line(&chunk));

    tracing::debug!(words = words.len(), lines = lines.len(), "words grouped into lines");
    lines
}
