//! Multi-line slide blocks built from timed lines.

use crate::{
    config::SlidesCfg,
    model::{Line, Slide},
};

/// Shortest duration a clamped slide may shrink to.
const MIN_SLIDE_SECS: f64 = 0.1;

fn fill_blocks(lines: &[Line], cfg: &SlidesCfg) -> Vec<Vec<Line>> {
    let mut blocks: Vec<Vec<Line>> = Vec::new();
    let mut rest = lines;

    while !rest.is_empty() {
        let seed = cfg.min_lines.min(rest.len()).max(1);
        let (block, tail) = rest.split_at(seed);
        let mut block = block.to_vec();
        rest = tail;

        let first_start = block[0].start;
        let mut chars: usize = block.iter().map(Line::char_len).sum();

        while block.len() < cfg.max_lines {
            let Some(next) = rest.first() else { break };
            let within_gap = next.start - first_start <= cfg.max_join_gap_s;
            let within_chars = chars + next.char_len() <= cfg.max_chars;
            if !(within_gap && within_chars) {
                break;
            }
            chars += next.char_len();
            block.push(next.clone());
            rest = &rest[1..];
        }

        blocks.push(block);
    }

    rebalance_tail(&mut blocks, cfg.min_lines);
    blocks
}

/// A lone trailing line borrows the last line of the block before it.
fn rebalance_tail(blocks: &mut [Vec<Line>], min_lines: usize) {
    let [.., prev, last] = blocks else { return };
    if last.len() == 1 && prev.len() > min_lines {
        if let Some(moved) = prev.pop() {
            last.insert(0, moved);
        }
    }
}

pub fn build_slides(lines: &[Line], cfg: &SlidesCfg) -> Vec<Slide> {
    let blocks = fill_blocks(lines, cfg);

    let starts: Vec<f64> = blocks
        .iter()
        .map(|b| b.iter().map(|l| l.start).fold(f64::INFINITY, f64::min))
        .collect();

    let slides: Vec<Slide> = blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            let start = starts[i];
            let natural_end =
                block.iter().map(|l| l.end).fold(f64::NEG_INFINITY, f64::max) + cfg.tail_pad_s;
            let end = match starts.get(i + 1) {
                Some(next_start) => {
                    let cap = (next_start - cfg.gap_s).max(start + MIN_SLIDE_SECS);
                    natural_end.min(cap)
                }
                None => natural_end,
            };
            Slide {
                index: i + 1,
                start,
                end,
                lines: block,
            }
        })
        .collect();

    tracing::debug!(lines = lines.len(), slides = slides.len(), "lines grouped into slides");
    slides
}
