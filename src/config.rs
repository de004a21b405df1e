use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{cli::Strategy, error::TimingError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: Logging,
    pub units: UnitsCfg,
    pub grouping: GroupingCfg,
    pub wrap: WrapCfg,
    pub slides: SlidesCfg,
    pub highlight: HighlightCfg,
    pub export: ExportCfg,
    pub formats: Formats,
}

impl Config {
    pub fn load(path_opt: Option<&Path>) -> Result<Self> {
        let default_path = Path::new("config.toml");
        let path = if let Some(p) = path_opt {
            Some(p)
        } else if default_path.exists() {
            Some(default_path)
        } else {
            None
        };

        let mut cfg = Config::default();

        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading config file: {}", path.display()))?;
            let parsed: Config = toml::from_str(&raw)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
            cfg = parsed;
        }

        cfg.validate().context("config rejected")?;
        Ok(cfg)
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        let s = toml::to_string_pretty(self).context("failed serializing config as TOML")?;
        Ok(s)
    }

    /// Rejects thresholds that would make the grouping stages degenerate.
    pub fn validate(&self) -> Result<(), TimingError> {
        fn check(ok: bool, msg: &str) -> Result<(), TimingError> {
            if ok {
                Ok(())
            } else {
                Err(TimingError::InvalidConfig(msg.to_string()))
            }
        }

        check(
            self.units.seconds_ceiling.is_finite() && self.units.seconds_ceiling > 0.0,
            "units.seconds_ceiling must be a positive number",
        )?;
        check(
            self.grouping.gap_break_s.is_finite() && self.grouping.gap_break_s >= 0.0,
            "grouping.gap_break_s must be >= 0",
        )?;
        check(
            self.grouping.max_line_duration_s.is_finite()
                && self.grouping.max_line_duration_s > 0.0,
            "grouping.max_line_duration_s must be > 0",
        )?;
        check(self.grouping.max_chars > 0, "grouping.max_chars must be > 0")?;
        check(self.grouping.max_words > 0, "grouping.max_words must be > 0")?;
        check(self.wrap.target_column > 0, "wrap.target_column must be > 0")?;
        check(self.slides.min_lines > 0, "slides.min_lines must be > 0")?;
        check(
            self.slides.max_lines >= self.slides.min_lines,
            "slides.max_lines must be >= slides.min_lines",
        )?;
        check(
            self.slides.max_join_gap_s.is_finite() && self.slides.max_join_gap_s >= 0.0,
            "slides.max_join_gap_s must be >= 0",
        )?;
        check(
            self.slides.tail_pad_s.is_finite() && self.slides.tail_pad_s >= 0.0,
            "slides.tail_pad_s must be >= 0",
        )?;
        check(
            self.slides.gap_s.is_finite() && self.slides.gap_s >= 0.0,
            "slides.gap_s must be >= 0",
        )?;
        check(self.highlight.chunk_size > 0, "highlight.chunk_size must be > 0")?;
        check(
            self.export.offset_s.is_finite(),
            "export.offset_s must be a finite number",
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
    pub debug_unit_samples: usize,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            debug_unit_samples: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsCfg {
    /// Largest value still read as seconds when a field carries no unit.
    pub seconds_ceiling: f64,
}

impl Default for UnitsCfg {
    fn default() -> Self {
        Self {
            seconds_ceiling: 600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingCfg {
    pub gap_break_s: f64,
    pub max_line_duration_s: f64,
    pub max_chars: usize,
    pub max_words: usize,
}

impl Default for GroupingCfg {
    fn default() -> Self {
        Self {
            gap_break_s: 0.45,
            max_line_duration_s: 4.5,
            max_chars: 42,
            max_words: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapCfg {
    pub min_chars: usize,
    pub target_column: usize,
}

impl Default for WrapCfg {
    fn default() -> Self {
        Self {
            min_chars: 26,
            target_column: 36,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidesCfg {
    pub min_lines: usize,
    pub max_lines: usize,
    pub max_join_gap_s: f64,
    pub max_chars: usize,
    pub tail_pad_s: f64,
    pub gap_s: f64,
}

impl Default for SlidesCfg {
    fn default() -> Self {
        Self {
            min_lines: 2,
            max_lines: 4,
            max_join_gap_s: 8.0,
            max_chars: 110,
            tail_pad_s: 0.4,
            gap_s: 0.08,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightCfg {
    pub chunk_size: usize,
}

impl Default for HighlightCfg {
    fn default() -> Self {
        Self { chunk_size: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportCfg {
    pub strategy: Strategy,
    pub offset_s: f64,
}

impl Default for ExportCfg {
    fn default() -> Self {
        Self {
            strategy: Strategy::Word,
            offset_s: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Formats {
    pub json: JsonCfg,
    pub tsv: TsvCfg,
    pub txt: TxtCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonCfg {
    pub wrapped: bool,
}

impl Default for JsonCfg {
    fn default() -> Self {
        Self { wrapped: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TsvCfg {
    pub time_units: String,
    pub columns: Vec<String>,
}

impl Default for TsvCfg {
    fn default() -> Self {
        Self {
            time_units: "seconds".to_string(),
            columns: vec![
                "index".to_string(),
                "start".to_string(),
                "end".to_string(),
                "text".to_string(),
                "keyframes".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TxtCfg {
    pub mode: String,
}

impl Default for TxtCfg {
    fn default() -> Self {
        Self {
            mode: "timestamp_range".to_string(),
        }
    }
}

pub fn init_tracing(logging: &Logging, cli_override_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = cli_override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_json = logging.format.to_lowercase() == "json";

    // Logs go to stderr so `--stdout` output stays clean.
    if is_json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .event_format(fmt::format().json())
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .pretty()
            .init();
    }

    tracing::info!(
        level = level,
        format = logging.format.as_str(),
        "logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: Config = toml::from_str("[grouping]\nmax_words = 6\n").unwrap();
        assert_eq!(cfg.grouping.max_words, 6);
        assert_eq!(cfg.grouping.max_chars, 42);
        assert_eq!(cfg.units.seconds_ceiling, 600.0);
        assert_eq!(cfg.slides.max_lines, 4);
        assert_eq!(cfg.export.strategy, Strategy::Word);
    }

    #[test]
    fn rejects_zero_max_words() {
        let mut cfg = Config::default();
        cfg.grouping.max_words = 0;
        assert!(matches!(cfg.validate(), Err(TimingError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_chunk_and_inverted_slide_bounds() {
        let mut cfg = Config::default();
        cfg.highlight.chunk_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.slides.min_lines = 3;
        cfg.slides.max_lines = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_ceiling() {
        let mut cfg = Config::default();
        cfg.units.seconds_ceiling = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let s = Config::default().to_toml_pretty().unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.export.strategy, Strategy::Word);
        assert_eq!(back.formats.tsv.columns.len(), 5);
    }
}
