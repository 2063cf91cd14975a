use chrono::{Local, NaiveDate};
use shared::PatientInfo;
use std::path::Path;

use crate::error::PipelineError;
use crate::inference::decision::decide;
use crate::inference::model::{InferenceResult, ModelHandle};
use crate::inference::preprocess::{self, ImageTensor};
use crate::report::models::{self, ReportRecord};

/// Single entry point shared by the web and desktop front ends:
/// image path + patient data in, report record out.
#[derive(Clone)]
pub struct Pipeline {
    classifier: ModelHandle,
}

impl Pipeline {
    pub fn new(classifier: ModelHandle) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ModelHandle {
        &self.classifier
    }

    pub fn run(&self, image_path: &Path, patient: PatientInfo) -> Result<ReportRecord, PipelineError> {
        self.run_on(image_path, patient, Local::now().date_naive())
    }

    pub fn run_on(
        &self,
        image_path: &Path,
        patient: PatientInfo,
        date: NaiveDate,
    ) -> Result<ReportRecord, PipelineError> {
        let image_ref = image_path.to_string_lossy();
        models::validate_inputs(&patient, &image_ref)?;

        let tensor = preprocess::normalize(image_path, self.classifier.input_shape())?;
        let result = self.infer_with_retry(&tensor)?;
        let verdict = decide(result.probability());
        log::info!(
            "Patient {}: {} (p = {:.3}, source {:?})",
            patient.id,
            verdict,
            result.probability(),
            self.classifier.source()
        );

        ReportRecord::assemble(
            patient,
            &image_ref,
            result,
            verdict,
            self.classifier.source(),
            date,
        )
    }

    fn infer_with_retry(&self, tensor: &ImageTensor) -> Result<InferenceResult, PipelineError> {
        match self.classifier.infer(tensor) {
            Err(PipelineError::InferenceTimeout(limit)) => {
                log::warn!("Inference exceeded {:?}, retrying once", limit);
                self.classifier.infer(tensor)
            }
            Err(e) => {
                if matches!(e, PipelineError::ShapeMismatch { .. }) {
                    log::error!("Model/normalizer disagreement: {}", e);
                }
                Err(e)
            }
            ok => ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::model::{Classifier, PredictionSource};
    use crate::inference::preprocess::InputShape;
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Replays scripted outcomes, one per call.
    struct ScriptedClassifier {
        outcomes: Mutex<Vec<Result<f32, PipelineError>>>,
    }

    impl ScriptedClassifier {
        fn new(mut outcomes: Vec<Result<f32, PipelineError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
            }
        }

        fn remaining(&self) -> usize {
            self.outcomes.lock().unwrap().len()
        }
    }

    impl Classifier for ScriptedClassifier {
        fn input_shape(&self) -> InputShape {
            InputShape::square(16)
        }

        fn source(&self) -> PredictionSource {
            PredictionSource::Model
        }

        fn infer(&self, _tensor: &ImageTensor) -> Result<InferenceResult, PipelineError> {
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected inference call");
            InferenceResult::new(outcome?)
        }
    }

    fn timeout() -> PipelineError {
        PipelineError::InferenceTimeout(Duration::from_millis(10))
    }

    fn scan(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("scan.png");
        RgbImage::from_pixel(20, 20, Rgb([90, 90, 90])).save(&path).unwrap();
        path
    }

    fn alice() -> PatientInfo {
        PatientInfo::from_form("Alice", "34", "Female", "P001")
    }

    #[test]
    fn retries_a_timed_out_inference_once() {
        let dir = TempDir::new().unwrap();
        let classifier = Arc::new(ScriptedClassifier::new(vec![Err(timeout()), Ok(0.7)]));
        let pipeline = Pipeline::new(classifier.clone());

        let record = pipeline.run(&scan(&dir), alice()).unwrap();
        assert_eq!(record.probability(), 0.7);
        assert_eq!(classifier.remaining(), 0);
    }

    #[test]
    fn second_timeout_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let classifier = Arc::new(ScriptedClassifier::new(vec![
            Err(timeout()),
            Err(timeout()),
            Ok(0.7),
        ]));
        let pipeline = Pipeline::new(classifier.clone());

        let err = pipeline.run(&scan(&dir), alice()).unwrap_err();
        assert!(matches!(err, PipelineError::InferenceTimeout(_)));
        assert_eq!(classifier.remaining(), 1);
    }

    #[test]
    fn other_inference_errors_are_not_retried() {
        let dir = TempDir::new().unwrap();
        let classifier = Arc::new(ScriptedClassifier::new(vec![
            Err(PipelineError::Inference("device lost".into())),
            Ok(0.7),
        ]));
        let pipeline = Pipeline::new(classifier.clone());

        let err = pipeline.run(&scan(&dir), alice()).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
        assert_eq!(classifier.remaining(), 1);
    }

    #[test]
    fn empty_image_path_is_incomplete_input() {
        let classifier = Arc::new(ScriptedClassifier::new(vec![Ok(0.7)]));
        let pipeline = Pipeline::new(classifier.clone());

        let err = pipeline.run(Path::new(""), alice()).unwrap_err();
        match err {
            PipelineError::IncompleteInput { missing } => assert_eq!(missing, vec!["image"]),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(classifier.remaining(), 1);
    }

    #[test]
    fn record_carries_the_requested_date() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(Arc::new(ScriptedClassifier::new(vec![Ok(0.5)])));
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();

        let record = pipeline.run_on(&scan(&dir), alice(), date).unwrap();
        assert_eq!(record.date(), date);
        assert!(record.verdict().is_detected());
    }
}
