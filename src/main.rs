//! Engine runner
//!
//! Loads a TOML configuration, drives the sidecar and logs firmware G-code,
//! and reads newline-delimited JSON telemetry snapshots from stdin.
//!
//! Usage: `lumen-composer <config.toml>`; log level from `LUMEN_LOG`.

use std::{env, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use log::{LevelFilter, Log, Metadata, Record, info, warn};
use lumen_composer::{Config, GcodeQueue, LightEngine, StandardAdapters, TelemetrySnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    #[allow(clippy::print_stderr)]
    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging() -> anyhow::Result<()> {
    let level = env::var("LUMEN_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    log::set_logger(&LOGGER).map_err(|err| anyhow::anyhow!("logger already set: {err}"))?;
    log::set_max_level(level);
    Ok(())
}

/// Prints G-code instead of executing it
struct LoggingQueue;

#[async_trait]
impl GcodeQueue for LoggingQueue {
    async fn run_gcode(&self, script: &str) -> Result<(), String> {
        for line in script.lines() {
            log::debug!("[gcode] {line}");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let path = env::args()
        .nth(1)
        .context("usage: lumen-composer <config.toml>")?;
    let config = Config::load(&path).with_context(|| format!("loading {path}"))?;
    info!("loaded {} groups from {path}", config.groups.len());

    let engine = LightEngine::new(config, StandardAdapters::new(Arc::new(LoggingQueue)));
    let (handle, task) = engine.spawn();

    let reader = {
        let handle = handle.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match serde_json::from_str::<TelemetrySnapshot>(&line) {
                        Ok(snapshot) => handle.submit_telemetry(snapshot),
                        Err(err) => warn!("ignoring telemetry line: {err}"),
                    },
                    Ok(None) => break,
                    Err(err) => {
                        warn!("stdin closed: {err}");
                        break;
                    }
                }
            }
        })
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("shutting down");
    handle.shutdown();
    reader.abort();
    task.await.context("render loop panicked")?;

    if let Ok(status) = serde_json::to_string(&handle.status()) {
        info!("final status: {status}");
    }
    Ok(())
}
