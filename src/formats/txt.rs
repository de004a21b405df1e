use crate::{config::Config, formats::time::format_vtt_timestamp, model::Timeline};

pub fn write_txt(t: &Timeline, cfg: &Config) -> String {
    let mode = cfg.formats.txt.mode.to_lowercase();
    let mut out = String::new();

    for unit in &t.units {
        // Rows of a wrapped line or slide share one output line.
        let text = unit.text.replace('\n', " / ");
        if mode == "text_only" {
            out.push_str(text.trim());
            out.push('\n');
        } else {
            out.push_str(&format!(
                "[{} --> {}] ",
                format_vtt_timestamp(unit.start),
                format_vtt_timestamp(unit.end),
            ));
            out.push_str(text.trim());
            out.push('\n');
        }
    }

    out
}
