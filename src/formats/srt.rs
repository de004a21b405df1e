use crate::{formats::time::format_srt_timestamp, model::Timeline};

pub fn write_srt(t: &Timeline) -> String {
    let mut out = String::new();

    for unit in &t.units {
        out.push_str(&unit.index.to_string());
        out.push('\n');

        out.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(unit.start),
            format_srt_timestamp(unit.end)
        ));

        for row in unit.text.lines() {
            out.push_str(row.trim());
            out.push('\n');
        }

        out.push('\n');
    }

    out
}
