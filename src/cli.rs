use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Parser)]
#[command(name = "lyricsync")]
#[command(
    about = "Turn aligned-lyrics timing records into display lines, slides and highlight keyframes."
)]
pub struct Args {
    /// Path to config TOML (defaults to ./config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build display timelines from aligned-lyrics JSON
    Build(BuildCmd),
    /// Print a JSON report on how the input's timings were interpreted
    Analyze(AnalyzeCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct BuildCmd {
    /// Input file paths, or '-' for stdin
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Display strategy (defaults to export.strategy from config)
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub to: Format,

    /// Reveal the highlight in steps of this many words
    #[arg(long)]
    pub chunk: Option<usize>,

    /// Seconds added to every exported time (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<f64>,

    /// Song id used for output naming (single input only)
    #[arg(long)]
    pub song_id: Option<String>,

    /// Output file path (single input only)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Allow overwriting output file
    #[arg(long)]
    pub overwrite: bool,

    /// Drop any cached preparation and rebuild from the input
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Parser)]
pub struct AnalyzeCmd {
    /// Input file path, or '-' for stdin
    pub input: String,

    /// How many raw records to echo in the report
    #[arg(long, default_value_t = 10)]
    pub samples: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Words regrouped into lines
    Word,
    /// Line records exactly as the source aligned them
    Api,
    /// Regrouped lines folded into two balanced rows
    WordWrap,
    /// Regrouped lines gathered into multi-line slides
    Slides,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Word => "word",
            Strategy::Api => "api",
            Strategy::WordWrap => "word-wrap",
            Strategy::Slides => "slides",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Json,
    Tsv,
    Srt,
    Txt,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Tsv => "tsv",
            Format::Srt => "srt",
            Format::Txt => "txt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let args = Args::parse_from([
            "lyricsync",
            "build",
            "song.json",
            "--strategy",
            "word-wrap",
            "--to",
            "srt",
            "--offset",
            "-0.25",
            "--chunk",
            "2",
        ]);
        let Command::Build(cmd) = args.command else {
            panic!("expected build");
        };
        assert_eq!(cmd.inputs, vec!["song.json".to_string()]);
        assert_eq!(cmd.strategy, Some(Strategy::WordWrap));
        assert_eq!(cmd.to, Format::Srt);
        assert_eq!(cmd.offset, Some(-0.25));
        assert_eq!(cmd.chunk, Some(2));
    }

    #[test]
    fn build_requires_input() {
        assert!(Args::try_parse_from(["lyricsync", "build"]).is_err());
    }

    #[test]
    fn strategy_names_match_cli_values() {
        for s in Strategy::value_variants() {
            let pv = s.to_possible_value().unwrap();
            assert_eq!(pv.get_name(), s.name());
        }
    }
}
