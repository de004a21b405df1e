use anyhow::{Result, anyhow};
use csv::WriterBuilder;

use crate::{
    config::Config,
    formats::time::{format_vtt_timestamp, round_ms, seconds_to_ms},
    model::{KeyframeSchedule, TimedUnit, Timeline},
};

pub fn write_tsv(t: &Timeline, cfg: &Config) -> Result<String> {
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(vec![]);

    let cols = &cfg.formats.tsv.columns;
    wtr.write_record(cols)?;

    for unit in &t.units {
        let row: Vec<String> = cols
            .iter()
            .map(|c| value_for_column(c, unit, cfg))
            .collect();
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().map_err(|e| anyhow!(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}

fn value_for_column(col: &str, unit: &TimedUnit, cfg: &Config) -> String {
    match col {
        "index" => unit.index.to_string(),
        "start" => fmt_time(unit.start, cfg),
        "end" => fmt_time(unit.end, cfg),
        // Rows stay on one TSV line.
        "text" => unit.text.replace('\n', "\\n"),
        "keyframes" => fmt_keyframes(&unit.schedule, cfg),
        _ => "".to_string(),
    }
}

fn fmt_time(secs: f64, cfg: &Config) -> String {
    match cfg.formats.tsv.time_units.as_str() {
        "ms" => seconds_to_ms(secs).to_string(),
        "timestamp" => format_vtt_timestamp(secs),
        _ => format!("{:.3}", secs),
    }
}

/// `time@percent` pairs separated by spaces.
fn fmt_keyframes(s: &KeyframeSchedule, cfg: &Config) -> String {
    s.keyframes
        .iter()
        .map(|k| format!("{}@{}", fmt_time(k.time, cfg), round_ms(k.percent)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Keyframe;

    fn timeline() -> Timeline {
        Timeline {
            song_id: "s".to_string(),
            strategy: "word",
            highlight_chunk: 1,
            offset: 0.0,
            units: vec![TimedUnit {
                index: 1,
                start: 0.5,
                end: 1.25,
                text: "la la".to_string(),
                lines: vec![],
                line_schedules: vec![],
                schedule: KeyframeSchedule {
                    keyframes: vec![
                        Keyframe {
                            time: 0.5,
                            percent: 0.0,
                        },
                        Keyframe {
                            time: 1.25,
                            percent: 100.0,
                        },
                    ],
                },
            }],
        }
    }

    #[test]
    fn default_columns_in_seconds() {
        let out = write_tsv(&timeline(), &Config::default()).unwrap();
        assert_eq!(
            out,
            "index\tstart\tend\ttext\tkeyframes\n1\t0.500\t1.250\tla la\t0.500@0 1.250@100\n"
        );
    }

    #[test]
    fn ms_units_and_custom_columns() {
        let mut cfg = Config::default();
        cfg.formats.tsv.time_units = "ms".to_string();
        cfg.formats.tsv.columns = vec![
            "start".to_string(),
            "end".to_string(),
            "bogus".to_string(),
        ];
        let out = write_tsv(&timeline(), &cfg).unwrap();
        assert_eq!(out, "start\tend\tbogus\n500\t1250\t\n");
    }
}
