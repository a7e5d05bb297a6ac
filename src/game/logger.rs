//! Game logger with verbosity levels and capture modes
//!
//! LogEntries use owned Strings so the buffer has no lifetime parameters;
//! tests capture to memory and assert on the entries.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;
use std::str::FromStr;

/// Verbosity level for game output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// No output at all
    Silent,
    /// Game results and fatal errors only
    Minimal,
    /// Turn markers, commands, chain and combat activity
    #[default]
    Normal,
    /// Everything, including per-effect tracing
    Verbose,
}

impl FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityLevel::Silent),
            "minimal" | "1" => Ok(VerbosityLevel::Minimal),
            "normal" | "2" => Ok(VerbosityLevel::Normal),
            "verbose" | "3" => Ok(VerbosityLevel::Verbose),
            _ => Err(format!(
                "unknown verbosity '{}' (expected silent|minimal|normal|verbose or 0-3)",
                s
            )),
        }
    }
}

/// Where emitted lines go. Capture is orthogonal to verbosity: the
/// buffer records every line, verbosity only gates stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Print, keep nothing
    #[default]
    Stdout,
    /// Record into the buffer, print nothing
    Memory,
    /// Print and record
    Both,
}

/// One recorded line
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Source tag, e.g. "agent_choice"
    pub category: Option<String>,
}

/// Borrow of the capture buffer. Derefs to a slice, so callers index
/// and iterate it like a `&[LogEntry]`.
pub struct LogGuard<'a>(Ref<'a, Vec<LogEntry>>);

impl Deref for LogGuard<'_> {
    type Target = [LogEntry];

    fn deref(&self) -> &[LogEntry] {
        &self.0
    }
}

/// Logger owned by the game. Emit methods take `&self` so engine code
/// can log while holding other borrows; the buffer sits behind a
/// RefCell for that reason.
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,

    /// Mirror agent decisions and replay hashes to stderr
    debug_trace: bool,

    buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_mode: OutputMode::default(),
            debug_trace: false,
            buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Switch to in-memory capture, suppressing stdout
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    /// Print buffered lines that pass the verbosity gate, then drop the
    /// whole buffer
    pub fn flush_buffer(&mut self) {
        for entry in self.buffer.borrow().iter() {
            if entry.level <= self.verbosity {
                self.print_line(entry.level, &entry.message);
            }
        }
        self.buffer.borrow_mut().clear();
    }

    /// Read-only view of captured entries
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard(self.buffer.borrow())
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn set_debug_trace(&mut self, enabled: bool) {
        self.debug_trace = enabled;
    }

    pub fn debug_trace_enabled(&self) -> bool {
        self.debug_trace
    }

    #[inline]
    fn print_line(&self, level: VerbosityLevel, message: &str) {
        if level == VerbosityLevel::Minimal {
            println!("{}", message);
        } else {
            println!("  {}", message);
        }
    }

    #[inline]
    fn emit(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        let printable = level <= self.verbosity;
        match self.output_mode {
            OutputMode::Stdout => {
                if printable {
                    self.print_line(level, message);
                }
            }
            OutputMode::Memory | OutputMode::Both => {
                self.buffer.borrow_mut().push(LogEntry {
                    level,
                    message: message.to_string(),
                    category: category.map(|c| c.to_string()),
                });
                if printable && self.output_mode == OutputMode::Both {
                    self.print_line(level, message);
                }
            }
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.emit(VerbosityLevel::Minimal, message, None);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.emit(VerbosityLevel::Normal, message, None);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, message, None);
    }

    /// Log an agent decision at Normal level
    ///
    /// The stdout line carries only the choice, not the agent kind, so
    /// logs match regardless of which agent made the choice.
    #[inline]
    pub fn agent_choice(&self, agent_name: &str, message: &str) {
        if self.debug_trace {
            eprintln!("  >>> {}: {}", agent_name, message);
        }
        self.emit(VerbosityLevel::Normal, message, Some("agent_choice"));
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.buffer.borrow().len())
            .finish()
    }
}

// The buffer is transient observer state: a cloned or deserialized logger
// starts with an empty one.
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            debug_trace: self.debug_trace,
            buffer: RefCell::new(Vec::new()),
        }
    }
}

impl Serialize for GameLogger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("GameLogger", 2)?;
        state.serialize_field("verbosity", &self.verbosity)?;
        state.serialize_field("output_mode", &self.output_mode)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for GameLogger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct GameLoggerData {
            verbosity: VerbosityLevel,
            output_mode: OutputMode,
        }

        let data = GameLoggerData::deserialize(deserializer)?;
        Ok(GameLogger {
            verbosity: data.verbosity,
            output_mode: data.output_mode,
            debug_trace: false,
            buffer: RefCell::new(Vec::new()),
        })
    }
}
