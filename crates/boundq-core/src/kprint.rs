//! Leveled stderr logging for boundq
//!
//! Each call writes one line under the stderr lock, tagged with the calling
//! thread's name (or id). The level check happens in the macro, so arguments
//! of a filtered-out message are never formatted.
//!
//! # Environment Variables
//!
//! - `BQ_LOG_LEVEL=<level>` - off/error/warn/info/debug/trace or 0..=5 (default: warn)
//! - `BQ_FLUSH_EPRINT=1` - Flush stderr after each line
//! - `BQ_LOG_TIME=1` - Prefix lines with microseconds since logging init
//!
//! # Usage
//!
//! ```ignore
//! use boundq_core::{kdebug, kwarn};
//!
//! kdebug!("queue closed with {} items to drain", n);
//! kwarn!("close() called twice");
//! ```

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Once, OnceLock};
use std::time::Instant;

/// Severity of a log line, most severe first
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Off,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    /// Out-of-range values saturate to `Trace`
    pub fn from_u8(v: u8) -> Self {
        Self::ALL[usize::from(v.min(5))]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse a level name or digit; `None` for anything unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return (n <= 5).then(|| Self::from_u8(n));
        }
        Self::ALL.into_iter().find(|l| l.name().eq_ignore_ascii_case(s))
    }

    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "E",
            LogLevel::Warn => "W",
            LogLevel::Info => "I",
            LogLevel::Debug => "D",
            LogLevel::Trace => "T",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Self::parse(s).ok_or(())
    }
}

// Bit layout of SETTINGS: low 3 bits level, then flush and time flags
const LEVEL_MASK: u8 = 0b0000_0111;
const FLUSH_BIT: u8 = 0b0000_1000;
const TIME_BIT: u8 = 0b0001_0000;
const INIT_BIT: u8 = 0b1000_0000;

static SETTINGS: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);
static INIT: Once = Once::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Pack a complete settings word, with `INIT_BIT` set
fn pack(level: Option<LogLevel>, flush: bool, time: bool) -> u8 {
    let mut s = level.unwrap_or(LogLevel::Warn) as u8 | INIT_BIT;
    if flush {
        s |= FLUSH_BIT;
    }
    if time {
        s |= TIME_BIT;
    }
    s
}

/// Load settings from `BQ_*` environment variables
///
/// Runs once; later calls are no-ops. Logging initializes itself lazily on
/// first use, so calling this is only needed for a deterministic start.
/// Threads racing the first log line wait here until the environment has
/// been applied. Programmatic setters called afterwards win.
pub fn init() {
    INIT.call_once(|| {
        EPOCH.get_or_init(Instant::now);
        let packed = pack(
            crate::env::env_get_opt::<LogLevel>("BQ_LOG_LEVEL"),
            crate::env::env_get_bool("BQ_FLUSH_EPRINT", false),
            crate::env::env_get_bool("BQ_LOG_TIME", false),
        );
        // INIT_BIT becomes visible only together with the env settings
        SETTINGS.store(packed, Ordering::Release);
    });
}

#[inline]
fn settings() -> u8 {
    let s = SETTINGS.load(Ordering::Acquire);
    if s & INIT_BIT == 0 {
        init();
        return SETTINGS.load(Ordering::Acquire);
    }
    s
}

fn set_flag(bit: u8, on: bool) {
    if on {
        SETTINGS.fetch_or(bit, Ordering::Relaxed);
    } else {
        SETTINGS.fetch_and(!bit, Ordering::Relaxed);
    }
}

/// Current maximum level that is printed
#[inline]
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(settings() & LEVEL_MASK)
}

pub fn set_log_level(level: LogLevel) {
    settings();
    let _ = SETTINGS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
        Some((s & !LEVEL_MASK) | level as u8)
    });
}

#[inline]
pub fn flush_enabled() -> bool {
    settings() & FLUSH_BIT != 0
}

/// Flush stderr after every line
pub fn set_flush_enabled(enabled: bool) {
    settings();
    set_flag(FLUSH_BIT, enabled);
}

/// Prefix lines with microseconds since logging init
pub fn set_time_enabled(enabled: bool) {
    settings();
    set_flag(TIME_BIT, enabled);
}

/// Whether a message at `level` would be printed
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

fn write_header(out: &mut impl Write, level: LogLevel) -> io::Result<()> {
    let s = settings();
    write!(out, "[bq:{}]", level.tag())?;
    if s & TIME_BIT != 0 {
        let micros = EPOCH.get_or_init(Instant::now).elapsed().as_micros();
        write!(out, " {:>10}us", micros)?;
    }
    let current = std::thread::current();
    match current.name() {
        Some(name) => write!(out, " <{}> ", name),
        None => write!(out, " <{:?}> ", current.id()),
    }
}

fn write_line(
    out: &mut impl Write,
    level: Option<LogLevel>,
    args: fmt::Arguments<'_>,
    newline: bool,
) -> io::Result<()> {
    if let Some(level) = level {
        write_header(out, level)?;
    }
    out.write_fmt(args)?;
    if newline {
        out.write_all(b"\n")?;
    }
    if flush_enabled() {
        out.flush()?;
    }
    Ok(())
}

/// Single write path for every macro
///
/// `level` of `None` prints unconditionally with no header.
#[doc(hidden)]
pub fn emit(level: Option<LogLevel>, args: fmt::Arguments<'_>, newline: bool) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    // Nowhere left to report a failing stderr
    let _ = write_line(&mut out, level, args, newline);
}

// ============================================================================
// Public Macros
// ============================================================================

/// Print to stderr (no newline, no header)
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::kprint::emit(None, format_args!($($arg)*), false)
    };
}

/// Print a line to stderr (no header, never filtered)
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint::emit(None, format_args!(""), true)
    };
    ($($arg:tt)*) => {
        $crate::kprint::emit(None, format_args!($($arg)*), true)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __klog {
    ($level:ident, $($arg:tt)*) => {
        if $crate::kprint::level_enabled($crate::kprint::LogLevel::$level) {
            $crate::kprint::emit(
                Some($crate::kprint::LogLevel::$level),
                format_args!($($arg)*),
                true,
            );
        }
    };
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => { $crate::__klog!(Error, $($arg)*) };
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => { $crate::__klog!(Warn, $($arg)*) };
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => { $crate::__klog!(Info, $($arg)*) };
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => { $crate::__klog!(Debug, $($arg)*) };
}

/// Most verbose level
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => { $crate::__klog!(Trace, $($arg)*) };
}
