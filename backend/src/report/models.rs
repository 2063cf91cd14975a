use chrono::NaiveDate;
use shared::{PatientInfo, PredictionResponse};
use std::fmt::Write;

use crate::error::PipelineError;
use crate::inference::decision::{Verdict, decide};
use crate::inference::model::{InferenceResult, PredictionSource};

/// Decimal places for the confidence in saved reports and the desktop view.
pub const REPORT_CONFIDENCE_DECIMALS: usize = 2;
/// Decimal places for the confidence in web responses.
pub const API_CONFIDENCE_DECIMALS: usize = 3;

/// Outcome of one detection run. Read-only once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    patient: PatientInfo,
    image_ref: String,
    result: InferenceResult,
    verdict: Verdict,
    source: PredictionSource,
    date: NaiveDate,
}

/// Every empty patient field, plus `image` when the reference is blank.
pub fn missing_inputs(patient: &PatientInfo, image_ref: &str) -> Vec<&'static str> {
    let mut missing = patient.missing_fields();
    if image_ref.trim().is_empty() {
        missing.push("image");
    }
    missing
}

pub fn validate_inputs(patient: &PatientInfo, image_ref: &str) -> Result<(), PipelineError> {
    let missing = missing_inputs(patient, image_ref);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::IncompleteInput { missing })
    }
}

impl ReportRecord {
    pub fn assemble(
        patient: PatientInfo,
        image_ref: &str,
        result: InferenceResult,
        verdict: Verdict,
        source: PredictionSource,
        date: NaiveDate,
    ) -> Result<Self, PipelineError> {
        validate_inputs(&patient, image_ref)?;
        if verdict != decide(result.probability()) {
            return Err(PipelineError::InconsistentVerdict {
                verdict,
                probability: result.probability(),
            });
        }
        Ok(Self {
            patient,
            image_ref: image_ref.to_string(),
            result,
            verdict,
            source,
            date,
        })
    }

    pub fn patient(&self) -> &PatientInfo {
        &self.patient
    }

    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    pub fn probability(&self) -> f32 {
        self.result.probability()
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn source(&self) -> PredictionSource {
        self.source
    }

    pub fn is_simulated(&self) -> bool {
        self.source == PredictionSource::Simulated
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn confidence_label(&self, decimals: usize) -> String {
        self.result.confidence_label(decimals)
    }

    pub fn to_prediction_response(&self) -> PredictionResponse {
        PredictionResponse {
            prediction: self.verdict.label().to_string(),
            confidence: self.confidence_label(API_CONFIDENCE_DECIMALS),
            patient: self.patient.clone(),
            simulated: self.is_simulated(),
        }
    }

    /// Plain-text report. Field order and labels are fixed.
    pub fn render(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Brain Tumor Detection Report");
        let _ = writeln!(text, "============================");
        let _ = writeln!(text);
        let _ = writeln!(text, "Patient Name : {}", self.patient.name);
        let _ = writeln!(text, "Age          : {}", self.patient.age);
        let _ = writeln!(text, "Gender       : {}", self.patient.gender_label());
        let _ = writeln!(text, "Patient ID   : {}", self.patient.id);
        let _ = writeln!(text);
        let _ = writeln!(text, "Result       : {}", self.verdict.label());
        let _ = writeln!(
            text,
            "Confidence   : {}",
            self.confidence_label(REPORT_CONFIDENCE_DECIMALS)
        );
        if self.is_simulated() {
            let _ = writeln!(text, "Source       : Simulated (no trained model loaded)");
        }
        let _ = writeln!(text);
        let _ = writeln!(text, "Next Steps:");
        let _ = writeln!(text, "{}", self.verdict.recommendation());
        text
    }
}
