use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::inference::preprocess::{ImageTensor, InputShape};

/// Loaded classifier shared by every request. Built once at startup.
pub type ModelHandle = Arc<dyn Classifier>;

/// Where a probability came from. Simulated results must stay visibly marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    Model,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceResult {
    probability: f32,
}

impl InferenceResult {
    pub fn new(probability: f32) -> Result<Self, PipelineError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(PipelineError::InvalidModelOutput(probability));
        }
        Ok(Self { probability })
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    pub fn confidence_label(&self, decimals: usize) -> String {
        format!("{:.*}", decimals, self.probability)
    }
}

pub trait Classifier: Send + Sync {
    fn input_shape(&self) -> InputShape;

    fn source(&self) -> PredictionSource;

    fn infer(&self, tensor: &ImageTensor) -> Result<InferenceResult, PipelineError>;
}

/// A model runtime that must be driven from a single thread.
pub trait InferenceBackend: Send {
    fn forward(&mut self, tensor: &ImageTensor) -> Result<f32, PipelineError>;
}

/// Stand-in used when no trained model is available. Output is derived from the
/// seed and the pixel data, so the same image always gets the same result.
pub struct StubClassifier {
    seed: u64,
    shape: InputShape,
}

impl StubClassifier {
    pub fn new(seed: u64, shape: InputShape) -> Self {
        Self { seed, shape }
    }
}

impl Classifier for StubClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Simulated
    }

    fn infer(&self, tensor: &ImageTensor) -> Result<InferenceResult, PipelineError> {
        tensor.check_shape(self.shape)?;

        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        for value in tensor.data().iter() {
            hasher.update(value.to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);

        let mut rng = StdRng::seed_from_u64(u64::from_le_bytes(seed_bytes));
        InferenceResult::new(rng.random_range(0.1f32..0.9))
    }
}

struct Job {
    tensor: ImageTensor,
    deadline: Instant,
    reply: mpsc::Sender<Result<f32, PipelineError>>,
}

/// Serializes calls into a non-thread-safe backend: one worker thread owns the
/// backend and handles one job at a time. Callers wait at most `timeout`; jobs still
/// queued when their caller's wait has expired are dropped without running.
pub struct QueuedClassifier {
    jobs: mpsc::Sender<Job>,
    shape: InputShape,
    timeout: Duration,
}

impl QueuedClassifier {
    pub fn spawn<B>(mut backend: B, shape: InputShape, timeout: Duration) -> Result<Self, PipelineError>
    where
        B: InferenceBackend + 'static,
    {
        let (jobs, queue) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("inference-worker".to_string())
            .spawn(move || {
                for job in queue {
                    if Instant::now() >= job.deadline {
                        log::debug!("Skipping inference job whose caller already timed out");
                        continue;
                    }
                    let outcome = backend.forward(&job.tensor);
                    // The caller may have timed out and gone away.
                    let _ = job.reply.send(outcome);
                }
                log::info!("Inference worker stopped");
            })
            .map_err(|e| PipelineError::ModelLoad(format!("failed to start inference worker: {e}")))?;

        Ok(Self {
            jobs,
            shape,
            timeout,
        })
    }
}

impl Classifier for QueuedClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Model
    }

    fn infer(&self, tensor: &ImageTensor) -> Result<InferenceResult, PipelineError> {
        tensor.check_shape(self.shape)?;

        let (reply, outcome) = mpsc::channel();
        self.jobs
            .send(Job {
                tensor: tensor.clone(),
                deadline: Instant::now() + self.timeout,
                reply,
            })
            .map_err(|_| PipelineError::Inference("inference worker is not running".to_string()))?;

        match outcome.recv_timeout(self.timeout) {
            Ok(probability) => InferenceResult::new(probability?),
            Err(RecvTimeoutError::Timeout) => Err(PipelineError::InferenceTimeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PipelineError::Inference(
                "inference worker stopped before replying".to_string(),
            )),
        }
    }
}

/// What to do when the model artifact cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFallback {
    Fail,
    Simulate,
}

pub fn load_classifier(config: &ModelConfig, fallback: ModelFallback) -> Result<ModelHandle, PipelineError> {
    match load_model(config) {
        Ok(handle) => Ok(handle),
        Err(e) if fallback == ModelFallback::Simulate => {
            log::warn!("Model unavailable ({}); serving simulated predictions", e);
            Ok(Arc::new(StubClassifier::new(
                config.stub_seed,
                config.input_shape(),
            )))
        }
        Err(e) => Err(e),
    }
}

#[cfg(feature = "torch")]
fn load_model(config: &ModelConfig) -> Result<ModelHandle, PipelineError> {
    let backend = crate::inference::torch::TorchBackend::load(&config.path)?;
    let classifier =
        QueuedClassifier::spawn(backend, config.input_shape(), config.inference_timeout())?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "torch"))]
fn load_model(config: &ModelConfig) -> Result<ModelHandle, PipelineError> {
    Err(PipelineError::ModelLoad(format!(
        "cannot load {}: built without the `torch` feature",
        config.path.display()
    )))
}
