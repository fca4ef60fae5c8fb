//! Execution substrate: context, ports, component lifecycle, scheduler and
//! pipeline construction.
mod cancel;
mod component;
mod context;
mod pipeline;
mod port;
mod scheduler;

pub use cancel::CancelToken;
pub use component::{Component, LifecycleState, require_initialized};
pub use context::{ContextHandle, LogSeverity, RuntimeContext, RuntimeContextOptions};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineRegistry};
pub use port::{InputPort, OutputPort, Slot};
pub use scheduler::Scheduler;
