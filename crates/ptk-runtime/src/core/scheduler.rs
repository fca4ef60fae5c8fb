use super::cancel::CancelToken;
use super::component::{Component, LifecycleState};
use super::context::ContextHandle;
use crate::error::{Result, RuntimeError};
use std::panic::{self, AssertUnwindSafe};

struct Entry {
    component: Box<dyn Component>,
    state: LifecycleState,
}

/// Single-threaded, cooperative round-robin driver for a list of components.
///
/// Components are initialized, started, ticked and stopped in registration
/// order, so a producer registered before its consumer hands over data within
/// the same tick.
#[derive(Default)]
pub struct Scheduler {
    context: Option<ContextHandle>,
    entries: Vec<Entry>,
    running: bool,
    tick: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        if !ctx.initialized() {
            return Err(RuntimeError::invalid_argument(
                "Scheduler::init() requires an initialized context",
            ));
        }
        if self.context.is_some() {
            return Err(RuntimeError::failed_precondition(
                "Scheduler::init() called more than once",
            ));
        }
        self.context = Some(ctx);
        Ok(())
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) -> Result<()> {
        if self.context.is_none() {
            return Err(RuntimeError::failed_precondition(
                "Scheduler::init() must be called before add_component()",
            ));
        }
        log::debug!("Registering component '{}'", component.name());
        self.entries.push(Entry {
            component,
            state: LifecycleState::Created,
        });
        Ok(())
    }

    /// Initializes then starts every component in registration order.
    ///
    /// The first failure is returned as is. Components started before it stay
    /// started; there is no rollback and the scheduler does not enter the
    /// running state.
    pub fn start(&mut self) -> Result<()> {
        let Some(ctx) = self.context.clone() else {
            return Err(RuntimeError::failed_precondition(
                "Scheduler::init() must be called before start()",
            ));
        };
        if self.running {
            return Err(RuntimeError::failed_precondition(
                "Scheduler is already running",
            ));
        }
        if self.entries.is_empty() {
            return Err(RuntimeError::failed_precondition("No components to run"));
        }

        for entry in &mut self.entries {
            if entry.state != LifecycleState::Created {
                return Err(RuntimeError::failed_precondition(format!(
                    "Component '{}' is already {}; it cannot be initialized twice",
                    entry.component.name(),
                    entry.state
                )));
            }
            entry.component.init(ctx.clone())?;
            entry.state = LifecycleState::Initialized;
            entry.component.start()?;
            entry.state = LifecycleState::Started;
        }

        self.tick = 0;
        self.running = true;
        ctx.log_info(format!(
            "Scheduler started with {} components.",
            self.entries.len()
        ));
        Ok(())
    }

    /// Runs `ticks` rounds. Does nothing when the scheduler is not running.
    pub fn run_loop(&mut self, ticks: u64) {
        if !self.running {
            log::warn!("Scheduler::run_loop() called while not running");
            return;
        }
        for _ in 0..ticks {
            self.tick_once();
        }
    }

    /// Runs rounds until `token` is cancelled. The token is only checked
    /// between ticks.
    pub fn run_until_cancelled(&mut self, token: &CancelToken) {
        if !self.running {
            log::warn!("Scheduler::run_until_cancelled() called while not running");
            return;
        }
        while !token.is_cancelled() {
            self.tick_once();
        }
    }

    fn tick_once(&mut self) {
        self.tick += 1;
        for entry in &mut self.entries {
            let component = &mut entry.component;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| component.tick()));
            if outcome.is_err() {
                let message = format!(
                    "Component '{}' panicked during tick {}",
                    component.name(),
                    self.tick
                );
                match &self.context {
                    Some(ctx) => ctx.log_error(message),
                    None => log::error!("{message}"),
                }
            }
        }
    }

    /// Stops every started component, logging rather than returning their errors.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        for entry in &mut self.entries {
            if entry.state != LifecycleState::Started {
                continue;
            }
            if let Err(e) = entry.component.stop() {
                let message = format!("Component '{}' failed to stop: {e}", entry.component.name());
                match &self.context {
                    Some(ctx) => ctx.log_error(message),
                    None => log::error!("{message}"),
                }
            }
            entry.state = LifecycleState::Stopped;
        }
        self.running = false;
        log::info!("Scheduler stopped after {} ticks", self.tick);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifecycle state of each component, in registration order.
    pub fn states(&self) -> Vec<(&str, LifecycleState)> {
        self.entries
            .iter()
            .map(|e| (e.component.name(), e.state))
            .collect()
    }
}
