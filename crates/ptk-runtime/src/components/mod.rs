//! Built-in pipeline stages.
//!
//! Sources publish on an [`OutputPort`](crate::core::OutputPort), transforms
//! read one port and write another, sinks only read. None of them allocate
//! ports themselves: the pipeline creates the [`Slot`](crate::core::Slot)s and
//! binds them before the scheduler starts.
mod camera;
mod camera_source;
mod counter;
mod frame_debugger;
mod heartbeat;
mod inference_stage;
mod preprocessor;

pub use camera::{Camera, SyntheticCamera, SyntheticCameraConfig};
pub use camera_source::CameraSource;
pub use counter::Counter;
pub use frame_debugger::FrameDebugger;
pub use heartbeat::Heartbeat;
pub use inference_stage::InferenceStage;
pub use preprocessor::{Preprocessor, PreprocessorConfig};
