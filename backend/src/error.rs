use std::path::PathBuf;
use std::time::Duration;

use crate::inference::decision::Verdict;

/// How a front end should present a failure to its user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The user can fix the request and resubmit.
    BadInput,
    /// The model could not be loaded; the service cannot classify anything.
    Unavailable,
    /// Inference took too long; retrying later may succeed.
    Transient,
    /// Configuration or programming error.
    Unexpected,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to decode image {path}: {reason}")]
    ImageDecode { path: PathBuf, reason: String },
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Tensor shape {actual:?} does not match model input {expected:?}")]
    ShapeMismatch { expected: [usize; 4], actual: Vec<usize> },
    #[error("Missing required fields: {}", .missing.join(", "))]
    IncompleteInput { missing: Vec<&'static str> },
    #[error("Inference did not finish within {0:?}")]
    InferenceTimeout(Duration),
    #[error("Model returned {0}, expected a probability in [0, 1]")]
    InvalidModelOutput(f32),
    #[error("Verdict {verdict} contradicts probability {probability}")]
    InconsistentVerdict { verdict: Verdict, probability: f32 },
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn class(&self) -> FailureClass {
        match self {
            PipelineError::ImageDecode { .. } | PipelineError::IncompleteInput { .. } => {
                FailureClass::BadInput
            }
            PipelineError::ModelLoad(_) => FailureClass::Unavailable,
            PipelineError::InferenceTimeout(_) => FailureClass::Transient,
            PipelineError::ShapeMismatch { .. }
            | PipelineError::InvalidModelOutput(_)
            | PipelineError::InconsistentVerdict { .. }
            | PipelineError::Inference(_)
            | PipelineError::ReportWrite { .. } => FailureClass::Unexpected,
        }
    }
}
