use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};

use crate::{
    analysis,
    cache::{Prepared, SongCache},
    cli::{AnalyzeCmd, BuildCmd, Format, Strategy},
    config::Config,
    formats,
    model::{Line, Slide, TimedUnit, Timeline},
    source,
    timing::highlight::{schedule_highlights, schedule_slide},
};

pub fn run_build(cmd: BuildCmd, cfg: &Config) -> Result<()> {
    let strategy = cmd.strategy.unwrap_or(cfg.export.strategy);
    let chunk = cmd.chunk.unwrap_or(cfg.highlight.chunk_size);
    let offset = cmd.offset.unwrap_or(cfg.export.offset_s);

    if chunk == 0 {
        return Err(anyhow!("--chunk must be at least 1"));
    }
    if !offset.is_finite() {
        return Err(anyhow!("--offset must be a finite number"));
    }
    if cmd.inputs.len() > 1 && (cmd.output.is_some() || cmd.song_id.is_some()) {
        return Err(anyhow!("--output and --song-id need exactly one input"));
    }

    let span = tracing::info_span!("build", strategy = strategy.name(), to = ?cmd.to);
    let _g = span.enter();

    let mut cache = SongCache::new();

    for input in &cmd.inputs {
        let song_id = cmd
            .song_id
            .clone()
            .unwrap_or_else(|| source::song_id_for(input));

        if cmd.refresh && cache.invalidate(&song_id) {
            tracing::info!(song_id = song_id.as_str(), "cached song invalidated");
        }

        let prepared = cache
            .get_or_prepare(&song_id, input, cfg, || source::load_payload(input))
            .with_context(|| format!("failed preparing song '{song_id}' from {input}"))?;

        let timeline = build_timeline(&song_id, prepared, strategy, chunk);
        if timeline.is_empty() {
            return Err(anyhow!(
                "no {} units available for export from {input}",
                strategy.name()
            ));
        }
        let timeline = apply_offset(timeline, offset);

        log_timeline_summary(&timeline, cfg);

        let rendered = render_any(&timeline, cmd.to, cfg)?;

        if cmd.stdout {
            print!("{rendered}");
            tracing::info!(mode = "stdout", "wrote output");
            continue;
        }

        let out_path = derive_output_path(&cmd, input, &song_id, strategy)?;
        write_output(&out_path, &rendered, cmd.overwrite)?;
        tracing::info!(path = out_path.as_str(), "wrote output file");
    }

    tracing::debug!(songs = cache.len(), "build finished");
    Ok(())
}

pub fn run_analyze(cmd: AnalyzeCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!("analyze", input = cmd.input.as_str());
    let _g = span.enter();

    let song_id = source::song_id_for(&cmd.input);
    let payload = source::load_payload(&cmd.input)?;
    let prepared = Prepared::from_payload(&payload, cfg)
        .with_context(|| format!("failed preparing song '{song_id}'"))?;

    let report = analysis::analyze(&song_id, &payload, &prepared, cfg, cmd.samples);
    let s = serde_json::to_string_pretty(&report).context("failed serializing report")?;
    println!("{s}");
    Ok(())
}

fn unit_for_line(index: usize, line: &Line, chunk: usize) -> TimedUnit {
    let schedule = schedule_highlights(line, chunk);
    TimedUnit {
        index,
        start: line.start,
        end: line.end,
        text: line.text.clone(),
        lines: vec![line.clone()],
        line_schedules: vec![schedule.clone()],
        schedule,
    }
}

fn unit_for_slide(slide: &Slide, chunk: usize) -> TimedUnit {
    TimedUnit {
        index: slide.index,
        start: slide.start,
        end: slide.end,
        text: slide.text(),
        lines: slide.lines.clone(),
        line_schedules: slide
            .lines
            .iter()
            .map(|l| schedule_highlights(l, chunk))
            .collect(),
        schedule: schedule_slide(slide, chunk),
    }
}

fn units_from_lines(lines: &[Line], chunk: usize) -> Vec<TimedUnit> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| unit_for_line(i + 1, l, chunk))
        .collect()
}

pub fn build_timeline(
    song_id: &str,
    prepared: &Prepared,
    strategy: Strategy,
    chunk: usize,
) -> Timeline {
    let units = match strategy {
        Strategy::Word => units_from_lines(&prepared.lines_word, chunk),
        Strategy::Api => units_from_lines(&prepared.lines_api, chunk),
        Strategy::WordWrap => units_from_lines(&prepared.lines_wrapped, chunk),
        Strategy::Slides => prepared
            .slides
            .iter()
            .map(|s| unit_for_slide(s, chunk))
            .collect(),
    };

    Timeline {
        song_id: song_id.to_string(),
        strategy: strategy.name(),
        highlight_chunk: chunk,
        offset: 0.0,
        units,
    }
}

fn shift(t: f64, offset: f64) -> f64 {
    (t + offset).max(0.0)
}

fn shift_line(l: &mut Line, offset: f64) {
    l.start = shift(l.start, offset);
    l.end = shift(l.end, offset);
    for t in &mut l.times {
        *t = shift(*t, offset);
    }
}

/// Moves every exported time by `offset`, clamping at zero.
pub fn apply_offset(mut t: Timeline, offset: f64) -> Timeline {
    if offset == 0.0 {
        return t;
    }

    let span = tracing::info_span!("apply_offset", offset);
    let _g = span.enter();

    for u in &mut t.units {
        u.start = shift(u.start, offset);
        u.end = shift(u.end, offset);
        for l in &mut u.lines {
            shift_line(l, offset);
        }
        for s in u.line_schedules.iter_mut().chain(std::iter::once(&mut u.schedule)) {
            for k in &mut s.keyframes {
                k.time = shift(k.time, offset);
            }
        }
    }
    t.offset += offset;
    t
}

fn log_timeline_summary(t: &Timeline, cfg: &Config) {
    tracing::info!(
        song_id = t.song_id.as_str(),
        strategy = t.strategy,
        units = t.units.len(),
        duration_s = t.duration(),
        "timeline summary"
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let n = cfg.logging.debug_unit_samples.min(t.units.len());
        for u in t.units.iter().take(n) {
            tracing::debug!(
                idx = u.index,
                start = u.start,
                end = u.end,
                lines = u.lines.len(),
                keyframes = u.schedule.keyframes.len(),
                chars = u.text.chars().count(),
                "unit sample"
            );
        }
    }
}

fn render_any(t: &Timeline, fmt: Format, cfg: &Config) -> Result<String> {
    match fmt {
        Format::Json => formats::json::write_json(t, cfg.formats.json.wrapped),
        Format::Tsv => formats::tsv::write_tsv(t, cfg),
        Format::Srt => Ok(formats::srt::write_srt(t)),
        Format::Txt => Ok(formats::txt::write_txt(t, cfg)),
    }
}

/// Keeps ids filesystem-safe: anything outside `[A-Za-z0-9_.-]` becomes `_`.
pub fn sanitize_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_sub = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
            out.push(ch);
            prev_sub = false;
        } else if !prev_sub {
            out.push('_');
            prev_sub = true;
        }
    }
    if out.is_empty() {
        "song".to_string()
    } else {
        out
    }
}

fn derive_output_path(
    cmd: &BuildCmd,
    input: &str,
    song_id: &str,
    strategy: Strategy,
) -> Result<String> {
    if let Some(o) = &cmd.output {
        return Ok(o.clone());
    }

    if input == "-" {
        return Err(anyhow!(
            "output path required when input is stdin and --stdout is not set"
        ));
    }

    let p = Path::new(input);
    let parent = p.parent().unwrap_or_else(|| Path::new("."));
    let name = format!(
        "{}_{}.{}",
        sanitize_filename(song_id),
        strategy.name(),
        cmd.to.extension()
    );
    Ok(parent.join(name).to_string_lossy().to_string())
}

fn write_output(path: &str, data: &str, overwrite: bool) -> Result<()> {
    if Path::new(path).exists() && !overwrite {
        return Err(anyhow!(
            "refusing to overwrite existing file (pass --overwrite): {path}"
        ));
    }
    fs::write(path, data).with_context(|| format!("failed writing output: {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_payload;
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"{
        "aligned_words": [
            {"word": "Hello", "start_s": 0.0, "end_s": 0.4},
            {"word": "world", "start_s": 0.5, "end_s": 0.9},
            {"word": "Goodbye", "start_s": 2.0, "end_s": 2.3}
        ]
    }"#;

    fn prepared() -> Prepared {
        Prepared::from_payload(&parse_payload(PAYLOAD).unwrap(), &Config::default()).unwrap()
    }

    #[test]
    fn word_timeline_end_to_end() {
        let t = build_timeline("s", &prepared(), Strategy::Word, 1);
        let texts: Vec<_> = t.units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello world", "Goodbye"]);
        assert_eq!((t.units[0].start, t.units[0].end), (0.0, 0.9));
        assert_eq!((t.units[1].start, t.units[1].end), (2.0, 2.3));
        assert_eq!(t.units[0].schedule.keyframes.last().map(|k| k.percent), Some(100.0));
        assert_eq!(t.units[1].index, 2);
    }

    #[test]
    fn slide_timeline_carries_member_schedules() {
        let t = build_timeline("s", &prepared(), Strategy::Slides, 1);
        assert_eq!(t.units.len(), 1);
        let u = &t.units[0];
        assert_eq!(u.text, "Hello world\nGoodbye");
        assert_eq!(u.line_schedules.len(), 2);
        assert_eq!(u.schedule.keyframes.len(), 3);
        assert_eq!(t.strategy, "slides");
    }

    #[test]
    fn api_strategy_can_be_empty() {
        let t = build_timeline("s", &prepared(), Strategy::Api, 1);
        assert!(t.is_empty());
    }

    #[test]
    fn offset_shifts_and_clamps() {
        let t = build_timeline("s", &prepared(), Strategy::Word, 1);
        let t = apply_offset(t, -0.5);
        assert_eq!(t.offset, -0.5);
        let first = &t.units[0];
        assert_eq!(first.start, 0.0);
        assert!((first.end - 0.4).abs() < 1e-9);
        assert_eq!(first.schedule.keyframes[0].time, 0.0);
        assert_eq!(first.lines[0].times[0], 0.0);
        assert!((t.units[1].start - 1.5).abs() < 1e-9);
    }

    #[test]
    fn same_stem_inputs_each_render_their_own_words() {
        let dir = tempfile::tempdir().unwrap();
        let mut inputs = Vec::new();
        for (sub, word) in [("a", "Alpha"), ("b", "Bravo")] {
            let sub = dir.path().join(sub);
            fs::create_dir(&sub).unwrap();
            let path = sub.join("song.json");
            fs::write(
                &path,
                format!(r#"[{{"word": "{word}", "start_s": 0, "end_s": 1}}]"#),
            )
            .unwrap();
            inputs.push(path.to_string_lossy().to_string());
        }

        let cmd = BuildCmd {
            inputs,
            strategy: Some(Strategy::Word),
            to: Format::Txt,
            chunk: None,
            offset: None,
            song_id: None,
            output: None,
            stdout: false,
            overwrite: false,
            refresh: false,
        };
        run_build(cmd, &Config::default()).unwrap();

        let a = fs::read_to_string(dir.path().join("a").join("song_word.txt")).unwrap();
        let b = fs::read_to_string(dir.path().join("b").join("song_word.txt")).unwrap();
        assert!(a.contains("Alpha"), "{a}");
        assert!(b.contains("Bravo"), "{b}");
    }

    #[test]
    fn sanitizes_song_ids() {
        assert_eq!(sanitize_filename("abc-123_x.y"), "abc-123_x.y");
        assert_eq!(sanitize_filename("a b/c??d"), "a_b_c_d");
        assert_eq!(sanitize_filename(""), "song");
    }
}
