use crate::core::{Component, ContextHandle, require_initialized};
use crate::error::Result;

const LOG_EVERY: u64 = 5;

/// Liveness signal: logs every fifth tick and the final count on stop.
#[derive(Debug, Default)]
pub struct Heartbeat {
    ctx: Option<ContextHandle>,
    count: u64,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Component for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        require_initialized(&ctx, self.name())?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.count = 0;
        if let Some(ctx) = &self.ctx {
            ctx.log_info("Heartbeat started.");
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.count += 1;
        if self.count % LOG_EVERY == 0 {
            if let Some(ctx) = &self.ctx {
                ctx.log_info(format!("Heartbeat tick: {}", self.count));
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!("Heartbeat stopped at count: {}", self.count));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RuntimeContext, RuntimeContextOptions};
    use crate::error::RuntimeError;
    use std::sync::Arc;

    #[test]
    fn counts_ticks_from_start() {
        let ctx = RuntimeContext::initialized_with(RuntimeContextOptions::default()).unwrap();
        let mut heartbeat = Heartbeat::new();
        heartbeat.init(ctx).unwrap();
        heartbeat.start().unwrap();
        for _ in 0..12 {
            heartbeat.tick();
        }
        assert_eq!(heartbeat.count(), 12);
        heartbeat.stop().unwrap();
        heartbeat.stop().unwrap();
    }

    #[test]
    fn init_needs_an_initialized_context() {
        let err = Heartbeat::new()
            .init(Arc::new(RuntimeContext::new()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }
}
