//! Minimal stderr logger for the `log` facade. Stdout stays reserved for the
//! JSON result.

use anyhow::{Result, anyhow};
use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:<5} {}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// Resolve the effective level: the configured level raised one step per
/// `-v`. An unparsable configured level falls back to `warn` with a warning.
pub fn level_for(configured: &str, verbose: u8) -> (LevelFilter, Option<String>) {
    let (base, warning) = match configured.trim().parse::<LevelFilter>() {
        Ok(level) => (level, None),
        Err(_) => (
            LevelFilter::Warn,
            Some(format!("Unknown log level '{configured}', using 'warn'")),
        ),
    };
    let levels = LevelFilter::iter().collect::<Vec<_>>();
    let idx = levels.iter().position(|l| *l == base).unwrap_or(0);
    let raised = levels[(idx + usize::from(verbose)).min(levels.len() - 1)];
    (raised, warning)
}

pub fn init(level: LevelFilter) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|err| anyhow!("failed to install logger: {err}"))?;
    log::set_max_level(level);
    Ok(())
}
