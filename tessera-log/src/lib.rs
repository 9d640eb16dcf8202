//! Tessera logging.
//!
//! Lightweight leveled logging shared by the Tessera crates. Output is
//! controlled entirely from the environment, so a mapping submission can be
//! traced without touching application code.
//!
//! # Usage
//!
//! ```rust
//! use tessera_log::{debug, info, warn};
//!
//! let index = "articles";
//! debug!("Building mapping for {}", index);
//! info!(target: "tessera::submit", "PUT {}/article/_mapping", index);
//! warn!("Response body could not be parsed");
//! ```
//!
//! # Environment Variables
//!
//! - `TESSERA_DEBUG=1` - Enable debug logging
//! - `TESSERA_LOG_LEVEL=trace|debug|info|warn|error|off` - Minimum level
//! - `TESSERA_LOG_FORMAT=pretty|compact|json` - Output format for stderr
//! - `TESSERA_LOG_BACKEND=stderr|facade` - Write to stderr or forward to the `log` crate
//! - `TESSERA_LOG_TIMESTAMPS=1|0` - Include timestamps

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ============================================================================
// Levels
// ============================================================================

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Per-member traversal detail
    Trace = 0,
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
    /// Nothing is logged
    Off = 5,
}

impl Level {
    /// Upper-case level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }

    fn to_log(self) -> Option<log::Level> {
        match self {
            Level::Trace => Some(log::Level::Trace),
            Level::Debug => Some(log::Level::Debug),
            Level::Info => Some(log::Level::Info),
            Level::Warn => Some(log::Level::Warn),
            Level::Error => Some(log::Level::Error),
            Level::Off => None,
        }
    }
}

/// Error returned when a level or format name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSetting(pub String);

impl fmt::Display for UnknownSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log setting: {}", self.0)
    }
}

impl std::error::Error for UnknownSetting {}

impl FromStr for Level {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(UnknownSetting(other.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Layout of records written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Timestamp, padded level, bracketed target
    Pretty,
    /// Single-letter level, short timestamp
    Compact,
    /// One JSON object per line
    Json,
}

impl FromStr for Format {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            other => Err(UnknownSetting(other.to_string())),
        }
    }
}

/// Where records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Formatted by this crate and written to stderr
    Stderr,
    /// Forwarded to whatever logger the `log` facade has installed
    Facade,
}

impl FromStr for Backend {
    type Err = UnknownSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stderr" => Ok(Backend::Stderr),
            "facade" | "log" => Ok(Backend::Facade),
            other => Err(UnknownSetting(other.to_string())),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(|| {
    let config = LogConfig::from_env();
    DEBUG_ENABLED.store(config.debug, Ordering::SeqCst);
    LOG_LEVEL.store(config.level as u8, Ordering::SeqCst);
    config
});

/// Logging configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Debug records forced on regardless of level
    pub debug: bool,
    /// Minimum level
    pub level: Level,
    /// Stderr layout
    pub format: Format,
    /// Output destination
    pub backend: Backend,
    /// Prefix records with a timestamp
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            backend: Backend::Stderr,
            timestamps: true,
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl LogConfig {
    /// Build a configuration from `TESSERA_*` environment variables.
    ///
    /// Unset or unparseable variables fall back to [`LogConfig::default`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debug = env_flag("TESSERA_DEBUG").unwrap_or(defaults.debug);
        let level = env_parse("TESSERA_LOG_LEVEL").unwrap_or(if debug {
            Level::Debug
        } else {
            defaults.level
        });

        Self {
            debug,
            level,
            format: env_parse("TESSERA_LOG_FORMAT").unwrap_or(defaults.format),
            backend: env_parse("TESSERA_LOG_BACKEND").unwrap_or(defaults.backend),
            timestamps: env_flag("TESSERA_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Read the environment now instead of on the first record.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// The configuration read from the environment.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Whether debug records are forced on.
#[inline]
pub fn is_debug_enabled() -> bool {
    init();
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Whether records at `level` are emitted.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    level != Level::Off && level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Current minimum level.
pub fn current_level() -> Level {
    init();
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Override the minimum level at runtime.
pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Force debug records on or off at runtime.
pub fn set_debug(enabled: bool) {
    init();
    DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled && current_level() > Level::Debug {
        set_level(Level::Debug);
    }
}

/// Emit a record. Called by the macros after the level check.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    let config = config();

    match config.backend {
        Backend::Facade => forward(level, target, message),
        Backend::Stderr => {
            let line = render(level, target, message, config);
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

fn forward(level: Level, target: &str, message: &str) {
    if let Some(level) = level.to_log() {
        log::logger().log(
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{}", message))
                .build(),
        );
    }
}

fn render(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    match config.format {
        Format::Pretty => {
            let mut line = String::new();
            if config.timestamps {
                line.push_str(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f ").to_string());
            }
            line.push_str(&format!("{:5} ", level.as_str()));
            if !target.is_empty() {
                line.push_str(&format!("[{}] ", target));
            }
            line.push_str(message);
            line
        }
        Format::Compact => {
            let mut line = String::new();
            if config.timestamps {
                line.push_str(&chrono::Local::now().format("%H:%M:%S ").to_string());
            }
            line.push(level.as_str().chars().next().unwrap_or('?'));
            line.push(' ');
            if !target.is_empty() {
                line.push_str(target);
                line.push_str(": ");
            }
            line.push_str(message);
            line
        }
        Format::Json => render_json(level, target, message, config.timestamps),
    }
}

#[cfg(feature = "json")]
fn render_json(level: Level, target: &str, message: &str, timestamps: bool) -> String {
    #[derive(serde::Serialize)]
    struct Record<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        level: &'a str,
        target: &'a str,
        message: &'a str,
    }

    let record = Record {
        timestamp: timestamps.then(|| chrono::Utc::now().to_rfc3339()),
        level: level.as_str(),
        target,
        message,
    };

    serde_json::to_string(&record).unwrap_or_else(|_| message.to_string())
}

#[cfg(not(feature = "json"))]
fn render_json(level: Level, target: &str, message: &str, timestamps: bool) -> String {
    let mut line = String::from("{");
    if timestamps {
        line.push_str(&format!("\"timestamp\":\"{}\",", chrono::Utc::now().to_rfc3339()));
    }
    line.push_str(&format!(
        "\"level\":\"{}\",\"target\":{:?},\"message\":{:?}}}",
        level.as_str(),
        target,
        message
    ));
    line
}

// ============================================================================
// Macros
// ============================================================================

/// Log a trace record.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        $crate::trace!(target: module_path!(), $($arg)+)
    };
}

/// Log a debug record.
///
/// Emitted when `TESSERA_DEBUG=1` or the level is `debug` or lower.
///
/// ```rust
/// use tessera_log::debug;
///
/// let depth = 2;
/// debug!("Truncating expansion at depth {}", depth);
/// debug!(target: "tessera::guard", "cycle on {}", "Node");
/// ```
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_debug_enabled() || $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        $crate::debug!(target: module_path!(), $($arg)+)
    };
}

/// Log an info record.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        $crate::info!(target: module_path!(), $($arg)+)
    };
}

/// Log a warning record.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        $crate::warn!(target: module_path!(), $($arg)+)
    };
}

/// Log an error record.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        $crate::error!(target: module_path!(), $($arg)+)
    };
}

// ============================================================================
// Tracing Integration
// ============================================================================

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! A `tracing` subscriber filtered at the level Tessera is configured for.

    use super::*;

    /// Subscriber honoring `RUST_LOG` first, then the Tessera level.
    pub fn subscriber() -> impl tracing::Subscriber {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{EnvFilter, fmt};

        let level = current_level().as_str().to_lowercase();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false))
    }
}
