use super::{Engine, EngineConfig, EngineError};
use crate::data::{Tensor, TensorView};
use burn::prelude::{Backend, Module};
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder};
use burn::tensor::TensorData;
use std::path::Path;

/// A burn module with a single float tensor in and a single float tensor out.
pub trait ForwardModule<B: Backend, const DI: usize, const DO: usize>: Module<B> {
    fn forward(&self, input: burn::tensor::Tensor<B, DI>) -> burn::tensor::Tensor<B, DO>;
}

/// Runs a [`ForwardModule`] on a burn backend.
///
/// `load` reads a named MessagePack record (full precision) into the module.
/// The freshly constructed module is usable before that, which is how tests
/// drive it.
pub struct BurnEngine<B: Backend, M, const DI: usize, const DO: usize> {
    model: M,
    device: B::Device,
    input_name: String,
    output_name: String,
    loaded: bool,
    config: EngineConfig,
}

impl<B, M, const DI: usize, const DO: usize> BurnEngine<B, M, DI, DO>
where
    B: Backend,
    M: ForwardModule<B, DI, DO>,
{
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            loaded: false,
            config: EngineConfig::default(),
        }
    }

    pub fn with_names(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input_name = input.into();
        self.output_name = output.into();
        self
    }

    /// Treats the in-memory weights as the model to serve.
    pub fn loaded(mut self) -> Self {
        self.loaded = true;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn to_burn(&self, view: &TensorView<'_>) -> Result<burn::tensor::Tensor<B, DI>, EngineError> {
        let dims = view
            .shape()
            .dims()
            .iter()
            .map(|d| usize::try_from(*d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| EngineError::InputMismatch(format!("bad shape {}", view.shape())))?;
        if dims.len() != DI {
            return Err(EngineError::InputMismatch(format!(
                "expected a rank {DI} input, got shape {}",
                view.shape()
            )));
        }
        let values = view.as_slice::<f32>()?.to_vec();
        let data = TensorData::new(values, dims);
        Ok(burn::tensor::Tensor::from_data(data, &self.device))
    }
}

impl<B, M, const DI: usize, const DO: usize> Engine for BurnEngine<B, M, DI, DO>
where
    B: Backend,
    M: ForwardModule<B, DI, DO>,
{
    fn load(&mut self, model_path: &Path) -> Result<(), EngineError> {
        let load_failed = |reason: String| EngineError::LoadFailed {
            path: model_path.to_path_buf(),
            reason,
        };
        let bytes = std::fs::read(model_path).map_err(|e| load_failed(e.to_string()))?;
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        let record = Recorder::<B>::load(&recorder, bytes, &self.device)
            .map_err(|e| load_failed(e.to_string()))?;
        self.model = self.model.clone().load_record(record);
        self.loaded = true;
        log::info!("Loaded burn model from {}", model_path.display());
        Ok(())
    }

    fn infer(&mut self, inputs: &[TensorView<'_>]) -> Result<Vec<Tensor>, EngineError> {
        if !self.loaded {
            return Err(EngineError::NotLoaded);
        }
        let [input] = inputs else {
            return Err(EngineError::InputMismatch(format!(
                "expected exactly one input, got {}",
                inputs.len()
            )));
        };

        let output = self.model.forward(self.to_burn(input)?);
        let shape = output
            .dims()
            .iter()
            .map(|d| *d as i64)
            .collect::<Vec<_>>();
        let values = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| EngineError::Backend(anyhow::anyhow!("{e:?}")))?;
        Ok(vec![Tensor::from_vec(values, shape)?])
    }

    fn input_names(&self) -> Vec<String> {
        if self.loaded {
            vec![self.input_name.clone()]
        } else {
            Vec::new()
        }
    }

    fn output_names(&self) -> Vec<String> {
        if self.loaded {
            vec![self.output_name.clone()]
        } else {
            Vec::new()
        }
    }

    fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }
}

#[cfg(all(test, feature = "burn-ndarray"))]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};

    type TestBackend = NdArray;

    #[derive(Module, Debug)]
    struct Head<B: Backend> {
        linear: Linear<B>,
    }

    impl<B: Backend> ForwardModule<B, 2, 2> for Head<B> {
        fn forward(&self, input: burn::tensor::Tensor<B, 2>) -> burn::tensor::Tensor<B, 2> {
            self.linear.forward(input)
        }
    }

    fn head(device: &<TestBackend as Backend>::Device) -> Head<TestBackend> {
        Head {
            linear: LinearConfig::new(3, 2).init(device),
        }
    }

    #[test]
    fn infers_with_in_memory_weights() {
        let device = Default::default();
        let mut engine = BurnEngine::<TestBackend, _, 2, 2>::new(head(&device), device).loaded();
        let values = [1f32, 2., 3., 4., 5., 6.];
        let outputs = engine
            .infer(&[TensorView::from_slice(&values, [2, 3])])
            .unwrap();
        assert_eq!(outputs[0].shape().dims(), &[2, 2]);
    }

    #[test]
    fn loads_recorded_weights() {
        let device = Default::default();
        let model = head(&device);
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        let bytes =
            Recorder::<TestBackend>::record(&recorder, model.into_record(), ()).unwrap();
        let path = std::env::temp_dir().join("ptk-burn-engine-head.mpk");
        std::fs::write(&path, bytes).unwrap();

        let mut engine = BurnEngine::<TestBackend, _, 2, 2>::new(head(&device), device);
        assert!(engine.input_names().is_empty());
        engine.load(&path).unwrap();
        assert_eq!(engine.output_names(), vec!["output".to_string()]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_wrong_rank() {
        let device = Default::default();
        let mut engine = BurnEngine::<TestBackend, _, 2, 2>::new(head(&device), device).loaded();
        let values = [0f32; 3];
        let err = engine
            .infer(&[TensorView::from_slice(&values, [3])])
            .unwrap_err();
        assert!(matches!(err, EngineError::InputMismatch(_)));
    }
}
