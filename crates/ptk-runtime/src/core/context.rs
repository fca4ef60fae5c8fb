use crate::error::{Result, RuntimeError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Shared handle passed to every component at `init`.
pub type ContextHandle = Arc<RuntimeContext>;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogSeverity {
    #[default]
    Info,
    Warning,
    Error,
}

impl From<LogSeverity> for log::Level {
    fn from(severity: LogSeverity) -> Self {
        match severity {
            LogSeverity::Info => log::Level::Info,
            LogSeverity::Warning => log::Level::Warn,
            LogSeverity::Error => log::Level::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeContextOptions {
    /// `log` target every runtime message is emitted under.
    pub log_target: String,
    /// Messages below this severity are dropped.
    pub min_severity: LogSeverity,
}

impl Default for RuntimeContextOptions {
    fn default() -> Self {
        Self {
            log_target: "ptk".to_string(),
            min_severity: LogSeverity::Info,
        }
    }
}

/// Clock and logging services shared by the scheduler and its components.
///
/// The context is read-mostly: `init` may succeed once, everything else takes
/// `&self` so the handle can be cloned freely before or after initialization.
#[derive(Debug)]
pub struct RuntimeContext {
    options: OnceLock<RuntimeContextOptions>,
    shut_down: AtomicBool,
    epoch: Instant,
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            options: OnceLock::new(),
            shut_down: AtomicBool::new(false),
            epoch: Instant::now(),
        }
    }

    /// Creates and initializes a context in one step.
    pub fn initialized_with(options: RuntimeContextOptions) -> Result<ContextHandle> {
        let ctx = Arc::new(Self::new());
        ctx.init(options)?;
        Ok(ctx)
    }

    pub fn init(&self, options: RuntimeContextOptions) -> Result<()> {
        self.options.set(options).map_err(|_| {
            RuntimeError::failed_precondition("RuntimeContext::init() called more than once")
        })
    }

    pub fn initialized(&self) -> bool {
        self.options.get().is_some()
    }

    pub fn shutdown(&self) {
        if self.initialized() && !self.shut_down.swap(true, Ordering::SeqCst) {
            self.log_info("Runtime context shut down.");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Monotonic nanoseconds since the context was created.
    pub fn now_nanoseconds(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    pub fn log(&self, severity: LogSeverity, message: impl AsRef<str>) {
        let message = match message.as_ref() {
            "" => "(null)",
            m => m,
        };
        let Some(options) = self.options.get() else {
            log::log!(
                target: "ptk",
                log::Level::from(severity),
                "[UNINITIALIZED][{severity}] {message}"
            );
            return;
        };
        if severity < options.min_severity {
            return;
        }
        log::log!(
            target: options.log_target.as_str(),
            log::Level::from(severity),
            "{message}"
        );
    }

    pub fn log_info(&self, message: impl AsRef<str>) {
        self.log(LogSeverity::Info, message)
    }

    pub fn log_warning(&self, message: impl AsRef<str>) {
        self.log(LogSeverity::Warning, message)
    }

    pub fn log_error(&self, message: impl AsRef<str>) {
        self.log(LogSeverity::Error, message)
    }
}
