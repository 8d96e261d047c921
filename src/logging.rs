//! In-crate logging - levels wi Scots names, a target filter and a wee
//! core that formats and fans oot tae sinks. Set `SICCAR_LOG` tae control
//! it, e.g. `SICCAR_LOG=mutter` or `SICCAR_LOG=siccar::coverage=whisper`.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use serde_json::{json, Map, Value as JsonValue};

/// Log levels, frae nae noise at aw up tae a steady whisper o detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Silence
    Wheesht = 0,
    /// Errors
    Roar = 1,
    /// Warnings
    Holler = 2,
    /// Info
    Blether = 3,
    /// Debug
    Mutter = 4,
    /// Trace
    Whisper = 5,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Wheesht => "WHEESHT",
            LogLevel::Roar => "ROAR",
            LogLevel::Holler => "HOLLER",
            LogLevel::Blether => "BLETHER",
            LogLevel::Mutter => "MUTTER",
            LogLevel::Whisper => "WHISPER",
        }
    }

    /// Accepts baith the Scots names and the usual ones
    pub fn parse_level(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "wheesht" | "off" | "silent" => Some(LogLevel::Wheesht),
            "roar" | "error" => Some(LogLevel::Roar),
            "holler" | "warn" | "warning" => Some(LogLevel::Holler),
            "blether" | "info" => Some(LogLevel::Blether),
            "mutter" | "debug" => Some(LogLevel::Mutter),
            "whisper" | "trace" => Some(LogLevel::Whisper),
            _ => None,
        }
    }
}

/// Global log level (default: Blether/INFO)
static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Blether as u8);

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Text,
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct LogFilter {
    pub default: LogLevel,
    pub rules: Vec<(String, LogLevel)>,
}

impl LogFilter {
    fn level_for_target(&self, target: &str) -> LogLevel {
        let mut best: Option<(usize, LogLevel)> = None;
        for (rule_target, level) in &self.rules {
            if rule_target.is_empty() {
                continue;
            }
            if target.starts_with(rule_target) {
                let len = rule_target.len();
                if best.map(|(best_len, _)| len > best_len).unwrap_or(true) {
                    best = Some((len, *level));
                }
            }
        }
        best.map(|(_, level)| level).unwrap_or(self.default)
    }
}

static LOG_FILTER: OnceLock<Mutex<LogFilter>> = OnceLock::new();

fn filter_state() -> &'static Mutex<LogFilter> {
    LOG_FILTER.get_or_init(|| {
        Mutex::new(LogFilter {
            default: LogLevel::Blether,
            rules: Vec::new(),
        })
    })
}

/// Parse a filter spec like `mutter` or `blether,siccar::report=whisper`
pub fn parse_filter(spec: &str) -> Result<LogFilter, String> {
    let mut default = None;
    let mut rules = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((target, level_str)) = part.split_once('=') {
            let level = LogLevel::parse_level(level_str.trim())
                .ok_or_else(|| format!("Invalid log level '{}'", level_str.trim()))?;
            rules.push((target.trim().to_string(), level));
        } else {
            let level = LogLevel::parse_level(part)
                .ok_or_else(|| format!("Invalid log level '{}'", part))?;
            default = Some(level);
        }
    }

    Ok(LogFilter {
        default: default.unwrap_or(LogLevel::Blether),
        rules,
    })
}

pub fn set_filter(spec: &str) -> Result<(), String> {
    let filter = parse_filter(spec)?;
    let mut guard = filter_state()
        .lock()
        .map_err(|_| "log filter lock poisoned".to_string())?;
    GLOBAL_LOG_LEVEL.store(filter.default as u8, Ordering::Relaxed);
    *guard = filter;
    Ok(())
}

pub fn log_enabled(level: LogLevel, target: &str) -> bool {
    let filter = filter_state().lock().unwrap_or_else(|e| e.into_inner());
    let effective = filter.level_for_target(target);
    (level as u8) <= (effective as u8)
}

pub fn get_global_log_level() -> LogLevel {
    match GLOBAL_LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Wheesht,
        1 => LogLevel::Roar,
        2 => LogLevel::Holler,
        3 => LogLevel::Blether,
        4 => LogLevel::Mutter,
        5 => LogLevel::Whisper,
        _ => LogLevel::Blether,
    }
}

pub fn set_global_log_level(level: LogLevel) {
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    if let Ok(mut guard) = filter_state().lock() {
        guard.default = level;
    }
}

/// Pick up `SICCAR_LOG` if it's set. Called by the CLI and the harness.
pub fn init_from_env() {
    if let Ok(spec) = std::env::var("SICCAR_LOG") {
        if set_filter(&spec).is_err() {
            eprintln!("Warning: Invalid SICCAR_LOG filter '{}'", spec);
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub target: String,
}

#[derive(Debug)]
pub enum LogSink {
    Stderr,
    Stdout,
    File {
        path: String,
        append: bool,
        file: Option<std::fs::File>,
    },
    Memory {
        entries: Vec<String>,
        max: usize,
    },
}

#[derive(Debug)]
pub struct LoggerCore {
    pub format: LogFormat,
    pub timestamps: bool,
    pub sinks: Vec<LogSink>,
}

impl LoggerCore {
    pub fn new() -> Self {
        LoggerCore {
            format: LogFormat::Text,
            timestamps: true,
            sinks: vec![LogSink::Stderr],
        }
    }

    pub fn log(&mut self, record: &LogRecord) {
        let formatted = self.format_record(record);
        for sink in &mut self.sinks {
            match sink {
                LogSink::Stderr => {
                    eprintln!("{}", formatted);
                }
                LogSink::Stdout => {
                    println!("{}", formatted);
                }
                LogSink::File { path, append, file } => {
                    if file.is_none() {
                        let mut opts = OpenOptions::new();
                        opts.create(true).write(true);
                        if *append {
                            opts.append(true);
                        } else {
                            opts.truncate(true);
                        }
                        match opts.open(path.as_str()) {
                            Ok(handle) => {
                                *file = Some(handle);
                            }
                            Err(err) => {
                                eprintln!("Warning: Couldnae open log file '{}': {}", path, err);
                            }
                        }
                    }
                    if let Some(handle) = file {
                        let _ = writeln!(handle, "{}", formatted);
                    }
                }
                LogSink::Memory { entries, max } => {
                    entries.push(formatted.clone());
                    if entries.len() > *max {
                        let drain = entries.len() - *max;
                        entries.drain(0..drain);
                    }
                }
            }
        }
    }

    pub fn format_record(&self, record: &LogRecord) -> String {
        match self.format {
            LogFormat::Json => self.format_json(record),
            LogFormat::Compact => self.format_compact(record),
            LogFormat::Text => self.format_text(record),
        }
    }

    fn format_text(&self, record: &LogRecord) -> String {
        let mut parts = Vec::new();
        parts.push(format!("[{:7}]", record.level.name()));
        if self.timestamps {
            parts.push(format!("{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f")));
        }
        if !record.target.is_empty() {
            parts.push(record.target.clone());
        }
        format!("{} | {}", parts.join(" "), record.message)
    }

    fn format_compact(&self, record: &LogRecord) -> String {
        format!("[{}] {}", record.level.name(), record.message)
    }

    fn format_json(&self, record: &LogRecord) -> String {
        let mut obj = Map::new();
        obj.insert(
            "ts".to_string(),
            JsonValue::String(format!("{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))),
        );
        obj.insert(
            "level".to_string(),
            JsonValue::String(record.level.name().to_string()),
        );
        obj.insert(
            "target".to_string(),
            JsonValue::String(record.target.clone()),
        );
        obj.insert("msg".to_string(), JsonValue::String(record.message.clone()));
        obj.insert("pid".to_string(), json!(std::process::id()));

        JsonValue::Object(obj).to_string()
    }

    /// Whit the memory sinks hae gathered, auldest first
    pub fn memory_entries(&self) -> Vec<String> {
        let mut all = Vec::new();
        for sink in &self.sinks {
            if let LogSink::Memory { entries, .. } = sink {
                all.extend(entries.iter().cloned());
            }
        }
        all
    }
}

impl Default for LoggerCore {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_LOGGER: OnceLock<Mutex<LoggerCore>> = OnceLock::new();

fn global_logger() -> &'static Mutex<LoggerCore> {
    GLOBAL_LOGGER.get_or_init(|| Mutex::new(LoggerCore::new()))
}

/// Log through the global core if the level passes the filter
pub fn log(level: LogLevel, target: &str, message: impl Into<String>) {
    if !log_enabled(level, target) {
        return;
    }
    let record = LogRecord {
        level,
        message: message.into(),
        target: target.to_string(),
    };
    if let Ok(mut core) = global_logger().lock() {
        core.log(&record);
    }
}

pub fn error(target: &str, message: impl Into<String>) {
    log(LogLevel::Roar, target, message);
}

pub fn warn(target: &str, message: impl Into<String>) {
    log(LogLevel::Holler, target, message);
}

pub fn info(target: &str, message: impl Into<String>) {
    log(LogLevel::Blether, target, message);
}

pub fn debug(target: &str, message: impl Into<String>) {
    log(LogLevel::Mutter, target, message);
}
