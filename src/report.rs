// Log and progress reporting
//
// The generator and reconciliation engine never reach for a global logger.
// They take a `&dyn Reporter`, which the front end picks: `LogReporter` for the
// CLI (log facade) or `PluginReporter` for the host plugin protocol.

use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity threshold, numbered the way the CLI flag takes it (1=trace .. 5=error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace = 1,
    Debug = 2,
    Info = 3,
    Warn = 4,
    Error = 5,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(LogLevel::Trace),
            2 => Some(LogLevel::Debug),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Warn),
            5 => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Frame character used by the plugin protocol
    fn frame_char(self) -> char {
        match self {
            LogLevel::Trace => 't',
            LogLevel::Debug => 'd',
            LogLevel::Info => 'i',
            LogLevel::Warn => 'w',
            LogLevel::Error => 'e',
        }
    }

    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(n) = s.trim().parse::<u8>() {
            return LogLevel::from_number(n).ok_or_else(|| format!("log level out of range: {}", n));
        }
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Observer for log messages and progress
pub trait Reporter {
    fn log(&self, level: LogLevel, message: &str);

    /// Fraction of work done, 0.0..=1.0
    fn progress(&self, fraction: f64);

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards to the `log` facade. Filtering is the installed logger's job.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn log(&self, level: LogLevel, message: &str) {
        log::log!(target: "metadata_mapper", level.into(), "{}", message);
    }

    fn progress(&self, fraction: f64) {
        log::debug!(target: "metadata_mapper", "progress {:.0}%", fraction.clamp(0.0, 1.0) * 100.0);
    }
}

/// Host plugin transport: SOH, level char, STX, message, newline.
pub struct PluginReporter<W: Write + Send> {
    threshold: LogLevel,
    out: Mutex<W>,
}

impl PluginReporter<std::io::Stderr> {
    pub fn stderr(threshold: LogLevel) -> Self {
        Self::new(threshold, std::io::stderr())
    }
}

impl<W: Write + Send> PluginReporter<W> {
    pub fn new(threshold: LogLevel, out: W) -> Self {
        Self {
            threshold,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_frame(&self, level_char: char, message: &str) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A broken stderr has nowhere left to report to
        let _ = write!(out, "\x01{}\x02{}\n", level_char, message);
        let _ = out.flush();
    }
}

impl<W: Write + Send> Reporter for PluginReporter<W> {
    fn log(&self, level: LogLevel, message: &str) {
        if level >= self.threshold {
            self.write_frame(level.frame_char(), message);
        }
    }

    fn progress(&self, fraction: f64) {
        self.write_frame('p', &fraction.clamp(0.0, 1.0).to_string());
    }
}

impl<W: Write + Send> std::fmt::Debug for PluginReporter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginReporter")
            .field("threshold", &self.threshold)
            .finish()
    }
}
