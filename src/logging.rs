//! File-backed sink for the `log` facade.
//!
//! The games own the terminal in raw mode, so records go to
//! `<data dir>/arcade.log` instead of stderr. Nothing is recorded unless
//! `ARCADE_LOG` names a level.

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const LOG_FILE: &str = "arcade.log";

struct FileLogger
{
    level: LevelFilter,
    file: Mutex<File>,
}

impl Log for FileLogger
{
    fn enabled(&self, metadata: &Metadata) -> bool
    {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record)
    {
        if !self.enabled(record.metadata()) {
            return;
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{secs} {:<5} {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self)
    {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

pub fn parse_level(value: &str) -> Option<LevelFilter>
{
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "off" => None,
        "1" | "on" | "true" => Some(LevelFilter::Info),
        other => other.parse().ok(),
    }
}

/// Installs the file logger when `ARCADE_LOG` is set.
pub fn init(data_dir: &Path) -> Result<()>
{
    let Some(level) = std::env::var("ARCADE_LOG")
        .ok()
        .and_then(|value| parse_level(&value))
    else {
        return Ok(());
    };

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    log::set_boxed_logger(Box::new(FileLogger {
        level,
        file: Mutex::new(file),
    }))
    .context("Logger already installed")?;
    log::set_max_level(level);
    log::info!("logging to {} at {level}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn levels_parse_from_names_and_switches()
    {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("WARN"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("1"), Some(LevelFilter::Info));
        assert_eq!(parse_level("off"), None);
        assert_eq!(parse_level("loud"), None);
    }
}
