//! Logging setup for dependency-planner
//!
//! The planner emits `tracing` events under the `dependency_planner` target:
//! `debug` for binding tables and finished resolutions, `trace` for every
//! source the resolution walk visits. This module installs a subscriber for
//! hosts that do not bring their own.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - JSON subscriber output
//! - `logging-pretty` - Multi-line human readable subscriber output
//!
//! # Example
//!
//! ```rust,ignore
//! use dependency_planner::logging;
//!
//! logging::builder()
//!     .trace()
//!     .planner_only()
//!     .compact()
//!     .init();
//! ```

#[cfg(feature = "logging")]
use tracing::Level;

/// Target every planner event is emitted under.
pub const TARGET: &str = "dependency_planner";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, colored
    Pretty,
    /// Single line per event
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(feature = "logging-json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Builder for the subscriber installed by [`LoggingBuilder::init`]
#[cfg(feature = "logging")]
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    /// Extra `EnvFilter` directives appended after the level filter
    directives: Vec<String>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

#[cfg(feature = "logging")]
impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::default(),
            target: None,
            directives: Vec::new(),
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

#[cfg(feature = "logging")]
impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Every visited source is logged at this level
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show planner events
    pub fn planner_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Add a raw `EnvFilter` directive, e.g. `"my_host=info"`
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// The `EnvFilter` directives this builder installs.
    pub fn filter_directives(&self) -> String {
        let mut directives = match self.target {
            Some(target) => format!("{target}={}", self.level),
            None => self.level.to_string(),
        };
        for directive in &self.directives {
            directives.push(',');
            directives.push_str(directive);
        }
        directives
    }

    /// Install the subscriber globally; `false` if one was already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> bool {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::new(self.filter_directives());
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);
        let registry = tracing_subscriber::registry().with(filter);

        let installed = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        };
        installed.is_ok()
    }

    /// Without a subscriber feature there is nothing to install.
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn try_init(self) -> bool {
        false
    }

    /// Install the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }
}

/// Create a new logging builder
#[cfg(feature = "logging")]
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install a subscriber in the default format at `debug`
#[cfg(feature = "logging")]
pub fn init() {
    builder().init();
}

/// Install a JSON subscriber at `debug`
#[cfg(feature = "logging")]
pub fn init_json() {
    builder().json().init();
}

/// Install a pretty subscriber at `debug`
#[cfg(feature = "logging")]
pub fn init_pretty() {
    builder().pretty().init();
}

/// Install a subscriber that only shows planner events
#[cfg(feature = "logging")]
pub fn init_planner_only() {
    builder().planner_only().init();
}
