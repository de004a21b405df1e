//! Step-held reveal schedules.
//!
//! A schedule starts at the line start with 0 % and steps up at the end of
//! every `chunk`-th word. The last word always closes the schedule, so a
//! non-empty line ends at exactly 100 %.

use crate::model::{Keyframe, KeyframeSchedule, Line, Slide};

fn percent(char_end: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * char_end as f64 / total as f64).clamp(0.0, 100.0)
}

pub fn schedule_highlights(line: &Line, chunk: usize) -> KeyframeSchedule {
    let chunk = chunk.max(1);
    let total = line.char_len();
    let mut keyframes = vec![Keyframe {
        time: line.start,
        percent: 0.0,
    }];

    if total == 0 {
        return KeyframeSchedule { keyframes };
    }

    let steps = line.char_ends.len().min(line.times.len());
    let mut last_time = line.start;
    let mut last_pct = 0.0;

    for i in 0..steps {
        let is_last = i + 1 == steps;
        if (i + 1) % chunk != 0 && !is_last {
            continue;
        }
        last_time = line.times[i].max(last_time);
        last_pct = percent(line.char_ends[i], total).max(last_pct);
        keyframes.push(Keyframe {
            time: last_time,
            percent: last_pct,
        });
    }

    KeyframeSchedule { keyframes }
}

/// Reveal schedule across a slide's lines, one step per finished line.
pub fn schedule_slide(slide: &Slide, chunk: usize) -> KeyframeSchedule {
    schedule_highlights(&slide.as_line(), chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn kf(time: f64, percent: f64) -> Keyframe {
        Keyframe { time, percent }
    }

    fn hello_world() -> Line {
        Line {
            start: 0.0,
            end: 0.9,
            text: "Hello big world".to_string(),
            char_ends: vec![5, 9, 15],
            times: vec![0.4, 0.6, 0.9],
        }
    }

    #[test]
    fn per_word_schedule() {
        let s = schedule_highlights(&hello_world(), 1);
        assert_eq!(
            s.keyframes,
            vec![
                kf(0.0, 0.0),
                kf(0.4, 100.0 * 5.0 / 15.0),
                kf(0.6, 60.0),
                kf(0.9, 100.0)
            ]
        );
    }

    #[test]
    fn chunked_schedule_still_reaches_full() {
        let s = schedule_highlights(&hello_world(), 2);
        assert_eq!(s.keyframes, vec![kf(0.0, 0.0), kf(0.6, 60.0), kf(0.9, 100.0)]);

        let s = schedule_highlights(&hello_world(), 10);
        assert_eq!(s.keyframes, vec![kf(0.0, 0.0), kf(0.9, 100.0)]);
    }

    #[test]
    fn empty_text_only_has_the_start_key() {
        let line = Line {
            start: 1.0,
            end: 2.0,
            text: String::new(),
            char_ends: vec![],
            times: vec![],
        };
        assert_eq!(schedule_highlights(&line, 1).keyframes, vec![kf(1.0, 0.0)]);
    }

    #[test]
    fn slide_schedule_steps_per_line() {
        let a = Line {
            start: 0.0,
            end: 1.0,
            text: "abc".to_string(),
            char_ends: vec![3],
            times: vec![1.0],
        };
        let b = Line {
            start: 1.0,
            end: 2.0,
            text: "def".to_string(),
            char_ends: vec![3],
            times: vec![2.0],
        };
        let slide = Slide {
            index: 1,
            start: 0.0,
            end: 2.4,
            lines: vec![a, b],
        };
        let s = schedule_slide(&slide, 1);
        assert_eq!(
            s.keyframes,
            vec![kf(0.0, 0.0), kf(1.0, 100.0 * 3.0 / 7.0), kf(2.0, 100.0)]
        );
    }

    fn line_strategy() -> impl Strategy<Value = Line> {
        (prop::collection::vec((1usize..12, 0.0f64..1.0), 1..30), 0.0f64..100.0).prop_map(
            |(steps, start)| {
                let mut char_ends = Vec::new();
                let mut times = Vec::new();
                let mut len = 0;
                let mut t = start;
                for (n, dt) in steps {
                    len += n + usize::from(len > 0);
                    t += dt;
                    char_ends.push(len);
                    times.push(t);
                }
                Line {
                    start,
                    end: t,
                    text: "x".repeat(len),
                    char_ends,
                    times,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn schedules_are_monotonic_and_complete(line in line_strategy(), chunk in 1usize..5) {
            let s = schedule_highlights(&line, chunk);
            let first = s.keyframes[0];
            prop_assert_eq!(first, kf(line.start, 0.0));
            prop_assert_eq!(s.keyframes.last().map(|k| k.percent), Some(100.0));
            for pair in s.keyframes.windows(2) {
                prop_assert!(pair[0].time <= pair[1].time);
                prop_assert!(pair[0].percent <= pair[1].percent);
            }
            for k in &s.keyframes {
                prop_assert!((0.0..=100.0).contains(&k.percent));
            }
        }
    }
}
