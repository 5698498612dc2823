//! Logging utilities for the q2-stats CLI
//!
//! Console messages are filtered by a process-wide verbosity level. Once
//! [`init_log_file`] has been called they are also mirrored, with timestamps,
//! to an append-only log file so that a failed task or action can be
//! inspected after the fact.

use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Only errors are shown.
pub const QUIET: u8 = 0;
/// Errors, warnings, steps and info messages.
pub const NORMAL: u8 = 1;
/// Everything above plus debug messages.
pub const VERBOSE: u8 = 2;
/// Everything above plus captured child process output.
pub const TRACE: u8 = 3;

static VERBOSITY: AtomicU8 = AtomicU8::new(NORMAL);

/// A log file larger than this is moved to `<name>.1` before it is reopened.
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;

static LOG_FILE: Mutex<Option<(PathBuf, File)>> = Mutex::new(None);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Debug,
    Info,
    Step,
    Success,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Step => "STEP",
            Level::Success => "OK",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    fn min_verbosity(self) -> u8 {
        match self {
            Level::Error => QUIET,
            Level::Debug => VERBOSE,
            _ => NORMAL,
        }
    }
}

/// Set the global verbosity level.
pub fn set_verbosity(level: u8) {
    VERBOSITY.store(level, Ordering::Relaxed);
}

pub fn get_verbosity() -> u8 {
    VERBOSITY.load(Ordering::Relaxed)
}

/// Log file location for a cache directory.
///
/// `Q2_STATS_LOG_FILE` overrides `<cache_dir>/q2-stats.log`.
pub fn log_path_in(cache_dir: &Path) -> PathBuf {
    if let Ok(path) = std::env::var("Q2_STATS_LOG_FILE") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    cache_dir.join("q2-stats.log")
}

/// Start mirroring messages to `path`.
pub fn init_log_file(path: PathBuf) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    rotate_if_large(&path, MAX_LOG_BYTES)?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some((path, file));
    }
    Ok(())
}

/// Move `path` to `<path>.1`, replacing any older copy, once it exceeds `limit` bytes.
fn rotate_if_large(path: &Path, limit: u64) -> io::Result<bool> {
    let Ok(meta) = fs::metadata(path) else {
        return Ok(false);
    };
    if meta.len() <= limit {
        return Ok(false);
    }
    let mut rotated = path.as_os_str().to_owned();
    rotated.push(".1");
    fs::rename(path, PathBuf::from(rotated))?;
    Ok(true)
}

/// Path of the active log file, if file logging was started.
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|(path, _)| path.clone()))
}

pub fn get_log_path_string() -> String {
    get_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unavailable>".to_string())
}

fn write_to_file(level: Level, msg: &str) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some((_, file)) = guard.as_mut() {
            let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
            let _ = writeln!(file, "{} [{}] {}", timestamp, level.label(), msg);
        }
    }
}

fn emit(level: Level, msg: &str) {
    write_to_file(level, msg);

    if get_verbosity() < level.min_verbosity() {
        return;
    }

    match level {
        Level::Debug => eprintln!("{} {}", "debug:".dimmed(), msg.dimmed()),
        Level::Info => eprintln!("{}", msg),
        Level::Step => eprintln!("{} {}", "==>".cyan().bold(), msg.bold()),
        Level::Success => eprintln!("{} {}", "✔".green(), msg),
        Level::Warn => eprintln!("{} {}", "warning:".yellow().bold(), msg),
        Level::Error => eprintln!("{} {}", "error:".red().bold(), msg),
    }
}

pub fn debug(msg: &str) {
    emit(Level::Debug, msg);
}

pub fn info(msg: &str) {
    emit(Level::Info, msg);
}

/// Announce the start of a user-visible step.
pub fn step(msg: &str) {
    emit(Level::Step, msg);
}

pub fn success(msg: &str) {
    emit(Level::Success, msg);
}

pub fn warn(msg: &str) {
    emit(Level::Warn, msg);
}

pub fn error(msg: &str) {
    emit(Level::Error, msg);
}

/// Record the stdout/stderr of a finished child process.
///
/// Output always goes to the log file; it is echoed to the console only at
/// [`TRACE`] verbosity.
pub fn capture_output(command: &str, output: &Output) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    write_to_file(
        Level::Debug,
        &format!("`{}` exited with {}", command, output.status),
    );
    for line in stdout.lines() {
        write_to_file(Level::Debug, &format!("[stdout] {}", line));
    }
    for line in stderr.lines() {
        write_to_file(Level::Debug, &format!("[stderr] {}", line));
    }

    if get_verbosity() >= TRACE {
        if !stdout.trim().is_empty() {
            eprintln!("{}", stdout.trim_end().dimmed());
        }
        if !stderr.trim().is_empty() {
            eprintln!("{}", stderr.trim_end().dimmed());
        }
    }
}

/// Start a spinner on stderr. Hidden when running quietly.
pub fn spinner(msg: &str) -> ProgressBar {
    if get_verbosity() < NORMAL {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
