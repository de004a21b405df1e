use crate::{config::WrapCfg, model::Line};

/// Folds a long line into two rows by turning the space nearest `target_column`
/// into a line break. Same char count, so `char_ends` stay valid.
pub fn wrap_line(line: &Line, target_column: usize, cfg: &WrapCfg) -> Line {
    let chars: Vec<char> = line.text.chars().collect();
    let len = chars.len();

    if len < cfg.min_chars || chars.contains(&'\n') {
        return line.clone();
    }

    let target = target_column.clamp(1, len);
    let best = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == ' ')
        .min_by_key(|(i, _)| i.abs_diff(target))
        .map(|(i, _)| i);

    let Some(best) = best else {
        return line.clone();
    };
    if best == 0 || best + 1 >= len {
        return line.clone();
    }

    let text: String = chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i == best { '\n' } else { *c })
        .collect();

    Line {
        text,
        ..line.clone()
    }
}

pub fn wrap_lines(lines: &[Line], cfg: &WrapCfg) -> Vec<Line> {
    lines
        .iter()
        .map(|l| wrap_line(l, cfg.target_column, cfg))
        .collect()
}
