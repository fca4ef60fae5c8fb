use crate::config::AppConfig;
use anyhow::{Context as _, bail};
use ptk_runtime::components::{
    CameraSource, FrameDebugger, Heartbeat, InferenceStage, Preprocessor, SyntheticCamera,
};
use ptk_runtime::core::{
    Pipeline, PipelineBuilder, PipelineRegistry, RuntimeContext, Scheduler, Slot,
};
use ptk_runtime::data::Frame;
use ptk_runtime::engine::{Engine, EngineBackend, PassthroughEngine};
use ptk_runtime::tasks::{SegmentationContract, SegmentationType, TaskOutput};
use ptk_runtime::Result;
use serde::Serialize;

/// Synthetic camera, preprocessor and semantic segmentation stage, ticked
/// in that order so every frame is segmented in the tick that captured it.
///
/// The engine is a passthrough, so the preprocessed image itself is decoded
/// as the model output: one channel per label.
pub struct DemoPipeline {
    config: AppConfig,
    outputs: Slot<TaskOutput>,
}

impl DemoPipeline {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            outputs: Slot::default(),
        }
    }

    /// Where the segmentation stage publishes its results.
    pub fn outputs(&self) -> &Slot<TaskOutput> {
        &self.outputs
    }
}

impl Pipeline for DemoPipeline {
    fn do_build(&mut self, registry: &mut PipelineRegistry<'_>) -> Result<()> {
        let raw = Slot::new(Frame::default());
        let preprocessed = Slot::new(Frame::default());

        let mut camera = CameraSource::new(SyntheticCamera::new(self.config.camera.clone()));
        camera.bind_output(&raw)?;

        let mut preprocessor = Preprocessor::new(self.config.preprocessor.clone());
        preprocessor.bind_input(&raw)?;
        preprocessor.bind_output(&preprocessed)?;

        let task = &self.config.task;
        let mut engine = PassthroughEngine::new(["image"], ["logits"]);
        engine.set_config(self.config.engine.clone());
        let contract = SegmentationContract::new(
            task.labels.clone(),
            SegmentationType::Semantic,
            task.mask_format,
        );
        let mut stage = match &task.model_path {
            Some(path) => {
                InferenceStage::new(Box::new(engine), Box::new(contract)).with_model_path(path)
            }
            None => InferenceStage::new(Box::new(engine.loaded()), Box::new(contract)),
        };
        stage.bind_input(&preprocessed)?;
        stage.bind_output(&self.outputs)?;

        registry
            .add_component(camera)
            .add_component(preprocessor)
            .add_component(stage);
        if task.debug_frames {
            let mut debugger = FrameDebugger::new();
            debugger.bind_input(&raw)?;
            registry.add_component(debugger);
        }
        registry.add_component(Heartbeat::new());
        Ok(())
    }
}

/// What a finished run reports.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub ticks: u64,
    pub last_output: TaskOutput,
}

/// Builds the demo pipeline, runs it for `ticks` ticks and stops it.
pub fn run_demo(config: AppConfig, ticks: u64) -> anyhow::Result<RunReport> {
    if config.engine.backend != EngineBackend::Passthrough {
        bail!(
            "The {} backend needs a model type compiled into the application",
            config.engine.backend
        );
    }

    let ctx = RuntimeContext::initialized_with(config.runtime.clone())?;
    let mut builder = PipelineBuilder::new(DemoPipeline::new(config));
    builder.build(&ctx).context("Failed to build the pipeline")?;

    let mut scheduler = Scheduler::new();
    scheduler.init(ctx.clone())?;
    builder.register_components(&mut scheduler)?;
    scheduler
        .start()
        .context("Failed to start the pipeline")?;

    scheduler.run_loop(ticks);
    scheduler.stop();
    ctx.shutdown();

    let last_output = builder.pipeline().outputs().borrow().clone();
    Ok(RunReport {
        ticks: scheduler.tick_count(),
        last_output,
    })
}
