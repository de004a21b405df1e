use anyhow::Result;
use clap::Parser;

mod analysis;
mod cache;
mod cli;
mod config;
mod error;
mod formats;
mod model;
mod pipeline;
mod source;
mod timing;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let cfg = config::Config::load(args.config.as_deref())?;
    config::init_tracing(&cfg.logging, args.log_level.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lyricsync starting");

    match args.command {
        cli::Command::Build(cmd) => pipeline::run_build(cmd, &cfg),
        cli::Command::Analyze(cmd) => pipeline::run_analyze(cmd, &cfg),
        cli::Command::PrintDefaultConfig => {
            let s = cfg.to_toml_pretty()?;
            print!("{s}");
            Ok(())
        }
    }
}
