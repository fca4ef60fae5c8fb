use super::component::Component;
use super::context::ContextHandle;
use super::scheduler::Scheduler;
use crate::error::{Result, RuntimeError};

/// Collects the components a [`Pipeline`] declares while it is being built.
pub struct PipelineRegistry<'a> {
    context: &'a ContextHandle,
    components: &'a mut Vec<Box<dyn Component>>,
}

impl PipelineRegistry<'_> {
    pub fn context(&self) -> &ContextHandle {
        self.context
    }

    /// Appends a component. Registration order is tick order.
    pub fn add_component(&mut self, component: impl Component + 'static) -> &mut Self {
        self.add_boxed(Box::new(component))
    }

    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> &mut Self {
        log::debug!("Pipeline declares component '{}'", component.name());
        self.components.push(component);
        self
    }
}

/// Application-specific wiring: create slots, bind ports, declare components.
pub trait Pipeline {
    fn do_build(&mut self, registry: &mut PipelineRegistry<'_>) -> Result<()>;
}

/// One-shot construction object around a [`Pipeline`].
pub struct PipelineBuilder<P> {
    pipeline: P,
    components: Vec<Box<dyn Component>>,
    built: bool,
}

impl<P: Pipeline> PipelineBuilder<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            components: Vec::new(),
            built: false,
        }
    }

    /// Runs [`Pipeline::do_build`] exactly once. A failed build leaves the
    /// builder unbuilt with no components declared.
    pub fn build(&mut self, ctx: &ContextHandle) -> Result<()> {
        if !ctx.initialized() {
            return Err(RuntimeError::invalid_argument(
                "Pipeline::build() requires an initialized context",
            ));
        }
        if self.built {
            return Err(RuntimeError::failed_precondition(
                "Pipeline::build() called more than once",
            ));
        }

        let mut registry = PipelineRegistry {
            context: ctx,
            components: &mut self.components,
        };
        if let Err(e) = self.pipeline.do_build(&mut registry) {
            self.components.clear();
            return Err(e);
        }

        self.built = true;
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of components declared and not yet handed to a scheduler.
    pub fn pending(&self) -> usize {
        self.components.len()
    }

    /// Moves the declared components into `scheduler`, in declaration order.
    pub fn register_components(&mut self, scheduler: &mut Scheduler) -> Result<()> {
        if !self.built {
            return Err(RuntimeError::failed_precondition(
                "Pipeline::build() must be called first",
            ));
        }
        for component in self.components.drain(..) {
            scheduler.add_component(component)?;
        }
        Ok(())
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> P {
        self.pipeline
    }
}
