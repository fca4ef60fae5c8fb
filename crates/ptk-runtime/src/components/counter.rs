use crate::core::{Component, ContextHandle, require_initialized};
use crate::error::Result;

#[derive(Debug)]
pub struct Counter {
    ctx: Option<ContextHandle>,
    count: u64,
    log_every: u64,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Counter {
    /// A counter that reports every `log_every` ticks (at least 1).
    pub fn new(log_every: u64) -> Self {
        Self {
            ctx: None,
            count: 0,
            log_every: log_every.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Component for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        require_initialized(&ctx, self.name())?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.count = 0;
        if let Some(ctx) = &self.ctx {
            ctx.log_info("Counter started.");
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.count += 1;
        if self.count % self.log_every == 0 {
            if let Some(ctx) = &self.ctx {
                ctx.log_info(format!("Counter reached {} ticks.", self.count));
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!("Counter stopped at count: {}", self.count));
        }
        Ok(())
    }
}
