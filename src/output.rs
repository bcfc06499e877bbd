use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress to the tracing subscriber.
pub struct LogOutput;

impl LogOutput {
    pub fn print_run(summary: &RunSummary) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "annotated {} records -> {}", summary.annotated, summary.output)?;
        if let Some(path) = &summary.failure_path {
            writeln!(
                stdout,
                "{} records without KOG definition -> {path}",
                summary.fallback
            )?;
        }
        for skipped in &summary.skipped {
            writeln!(stdout, "skipped {}: {}", skipped.id, skipped.reason)?;
        }
        Ok(())
    }
}

impl ProgressSink for LogOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}
