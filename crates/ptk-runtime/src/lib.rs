//! Runtime for small, single-threaded perception pipelines.
//!
//! Components exchange [`Frame`](data::Frame)s through typed ports, a
//! [`Scheduler`](core::Scheduler) drives them in insertion order and
//! [`TaskContract`](tasks::TaskContract)s turn raw engine outputs into typed,
//! validated results.
//!
//! ```no_run
//! use ptk_runtime::components::Heartbeat;
//! use ptk_runtime::core::{RuntimeContext, RuntimeContextOptions, Scheduler};
//!
//! # fn main() -> ptk_runtime::error::Result<()> {
//! let ctx = RuntimeContext::initialized_with(RuntimeContextOptions::default())?;
//! let mut scheduler = Scheduler::new();
//! scheduler.init(ctx)?;
//! scheduler.add_component(Box::new(Heartbeat::new()))?;
//! scheduler.start()?;
//! scheduler.run_loop(10);
//! scheduler.stop();
//! # Ok(())
//! # }
//! ```
pub mod components;
pub mod core;
pub mod data;
pub mod engine;
pub mod error;
pub mod operators;
pub mod tasks;
pub mod types;

pub use error::{Result, RuntimeError, StatusCode};
