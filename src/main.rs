//! MarlinKit replay tool
//!
//! Feeds a capture of controller output through a runner and prints one JSON
//! event per line. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use marlinkit::{
    init_logging, Config, Error, Event, HoldPrompt, HoldReason, HoldStatus, MarlinEvent,
    MarlinEventKind, MarlinRunner, Result, RunnerConfig,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc;

/// Replay Marlin controller output through a runner
#[derive(Parser, Debug)]
#[command(name = "marlinkit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Capture file to replay (default: stdin)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Config file (default: platform config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Comma-separated event names to print (default: all)
    #[arg(short, long, value_delimiter = ',', value_name = "NAMES")]
    events: Vec<MarlinEventKind>,

    /// Hold the feeder on every error event and print the prompt
    #[arg(long)]
    hold_on_error: bool,

    /// Print the runner state after the last line
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_default().context("loading default config")?,
    };
    init_logging(&config.logging)?;
    tracing::debug!("marlinkit {} ({})", marlinkit::VERSION, marlinkit::BUILD_DATE);

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let lines = replay(&args, config.runner.to_runner_config(), input, &mut out)?;
    tracing::info!("Replayed {} lines", lines);
    Ok(())
}

/// Replay `input` through a fresh runner, writing JSON lines to `out`
fn replay(
    args: &Args,
    config: RunnerConfig,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<usize> {
    let mut runner = MarlinRunner::with_config(config);
    let (tx, rx) = mpsc::channel::<MarlinEvent>();

    let mut kinds = if args.events.is_empty() {
        MarlinEventKind::ALL.to_vec()
    } else {
        args.events.clone()
    };
    // Error events drive the hold even when they are not printed
    if args.hold_on_error && !kinds.contains(&MarlinEventKind::Error) {
        kinds.push(MarlinEventKind::Error);
    }
    for kind in kinds {
        let tx = tx.clone();
        runner.on(kind, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    drop(tx);

    let lines = runner.parse_reader_with(input, |runner| {
        for event in rx.try_iter() {
            let wanted = args.events.is_empty() || args.events.contains(&event.kind());
            if wanted {
                let json = serde_json::to_string(&event).map_err(|e| Error::other(e.to_string()))?;
                writeln!(out, "{}", json)?;
            }
            match &event {
                MarlinEvent::Error(error) if args.hold_on_error => {
                    hold_on_error(runner, &error.message, &mut *out)?;
                }
                _ => {}
            }
        }
        Ok(())
    })?;

    if args.summary {
        writeln!(out, "{}", summary(&runner))?;
    }
    Ok(lines)
}

/// Act as the feeder: hold on the error and print the resulting prompt
fn hold_on_error(runner: &mut MarlinRunner, message: &str, out: &mut impl Write) -> Result<()> {
    runner.update_feeder_status(HoldStatus::held(
        HoldReason::error(message).with_msg(message),
    ));
    let status = runner.hold_status();
    if let Some(prompt) = HoldPrompt::from_status(&status) {
        let line = serde_json::json!({ "hold": status, "prompt": prompt });
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn summary(runner: &MarlinRunner) -> serde_json::Value {
    serde_json::json!({
        "summary": {
            "firmware": runner.firmware_info(),
            "position": runner.position(),
            "extruder": runner.extruder(),
            "heatedBed": runner.heated_bed(),
            "hotend": runner.hotend(),
            "hold": runner.hold_status(),
        }
    })
}
