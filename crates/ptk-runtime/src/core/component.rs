use super::context::{ContextHandle, RuntimeContext};
use crate::error::{Result, RuntimeError};

/// Where a component is in its lifecycle, as tracked by the [`Scheduler`](super::Scheduler).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Created,
    Initialized,
    Started,
    Stopped,
}

/// A pipeline stage driven by the scheduler.
///
/// The call order is `init`, `start`, any number of `tick`s, then `stop`.
/// Only `tick` is repeated, and it never returns an error: a stage that cannot
/// do its work for one tick logs the reason through the context and skips it.
pub trait Component {
    fn name(&self) -> &str;

    /// Binds the shared runtime services. Fails with `InvalidArgument` when the
    /// context was never initialized.
    fn init(&mut self, ctx: ContextHandle) -> Result<()>;

    /// Checks that every required port is bound. Must not have side effects
    /// when it fails.
    fn start(&mut self) -> Result<()>;

    fn tick(&mut self);

    /// Releases resources and logs final counters. Calling it twice is harmless.
    fn stop(&mut self) -> Result<()>;
}

/// Shared `init` check: the handle must point at an initialized context.
pub fn require_initialized(ctx: &RuntimeContext, component: &str) -> Result<()> {
    if !ctx.initialized() {
        return Err(RuntimeError::invalid_argument(format!(
            "{component}: runtime context is not initialized"
        )));
    }
    Ok(())
}
