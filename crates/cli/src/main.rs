//! duolog command-line front end.
//!
//! Reads commands from stdin until an empty line. One worker thread stores
//! each command in a shared log while the other reports every new head.
//! Log records go to stdout; diagnostics go to stderr.

mod commands;
mod format;

use std::path::Path;
use std::process;
use std::time::Duration;

use clap::ArgMatches;
use duolog_core::{Error, Result};
use duolog_engine::{
    Coordinator, CoordinatorConfig, OversizePolicy, RunReport, TracingSink, WatchMode,
};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{ConsoleSink, OutputMode};

fn main() {
    let matches = build_cli().get_matches();

    let output_mode = matches
        .get_one::<String>("format")
        .and_then(|f| OutputMode::from_arg(f))
        .unwrap_or(OutputMode::Plain);
    init_tracing(matches.get_count("verbose"), output_mode);

    match run(&matches, output_mode) {
        Ok(report) => {
            tracing::info!(
                producer = %report.producer,
                entries = report.entries.len(),
                events = report.events_logged,
                "run complete"
            );
        }
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbosity: u8, mode: OutputMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        if mode == OutputMode::Tracing {
            EnvFilter::new(format!("{},duolog::journal=info", level))
        } else {
            EnvFilter::new(level)
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init();
}

fn run(matches: &ArgMatches, mode: OutputMode) -> Result<RunReport> {
    let config = load_config(matches)?;
    let builder = Coordinator::builder().config(config).stdin();
    let builder = match mode {
        OutputMode::Tracing => builder.sink(TracingSink),
        OutputMode::Plain => builder.sink(ConsoleSink::plain()),
        OutputMode::Json => builder.sink(ConsoleSink::json()),
    };
    builder.run()
}

/// Config file first, then flags on top.
fn load_config(matches: &ArgMatches) -> Result<CoordinatorConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CoordinatorConfig::load(Path::new(path))?,
        None => CoordinatorConfig::default(),
    };

    if let Some(ms) = matches.get_one::<u64>("poll-interval-ms") {
        config.poll_interval_ms = *ms;
    }
    if let Some(mode) = matches.get_one::<String>("watch") {
        config.watch_mode = match mode.as_str() {
            "notify" => WatchMode::Notify,
            "poll" => WatchMode::Poll,
            other => return Err(Error::Config(format!("unknown watch mode '{}'", other))),
        };
    }
    if let Some(len) = matches.get_one::<usize>("max-line-len") {
        config.max_line_len = *len;
    }
    if matches.get_flag("reject-oversize") {
        config.oversize = OversizePolicy::Reject;
    }

    config.validate()?;
    tracing::debug!(
        interval = ?Duration::from_millis(config.poll_interval_ms),
        watch = ?config.watch_mode,
        max_line_len = config.max_line_len,
        oversize = ?config.oversize,
        "configuration loaded"
    );
    Ok(config)
}
