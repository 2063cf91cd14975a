use std::path::Path;
use tch::{CModule, Device, Kind, Tensor};

use crate::error::PipelineError;
use crate::inference::model::InferenceBackend;
use crate::inference::preprocess::ImageTensor;

/// TorchScript classifier taking a `(1, H, W, 3)` float batch and producing one probability.
pub struct TorchBackend {
    module: CModule,
    device: Device,
}

impl TorchBackend {
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::ModelLoad(format!(
                "model file {} not found",
                model_path.display()
            )));
        }

        let device = Device::cuda_if_available();
        let mut module = CModule::load_on_device(model_path, device)
            .map_err(|e| PipelineError::ModelLoad(e.to_string()))?;
        module.set_eval();
        log::info!("Loaded model {} on {:?}", model_path.display(), device);

        Ok(Self { module, device })
    }
}

impl InferenceBackend for TorchBackend {
    fn forward(&mut self, tensor: &ImageTensor) -> Result<f32, PipelineError> {
        let shape = tensor.shape();
        let dims = [
            shape[0] as i64,
            shape[1] as i64,
            shape[2] as i64,
            shape[3] as i64,
        ];
        let input = Tensor::from_slice(&tensor.to_vec())
            .view(dims)
            .to_device(self.device);

        let output = tch::no_grad(|| self.module.forward_ts(&[input]))
            .map_err(|e| PipelineError::Inference(e.to_string()))?;
        let output_flat = output.to_kind(Kind::Float).view([-1]);

        let num_elements = output_flat.size()[0];
        if num_elements != 1 {
            return Err(PipelineError::Inference(format!(
                "model returned {} values, expected a single probability",
                num_elements
            )));
        }
        Ok(output_flat.double_value(&[0]) as f32)
    }
}
