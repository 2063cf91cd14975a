use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::report::models::ReportRecord;

/// Writes rendered reports into one directory.
///
/// Names are derived from patient id and report date only, so a second report for
/// the same patient on the same day replaces the first (last write wins).
#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn file_name(patient_id: &str, date: NaiveDate) -> String {
        let safe_id: String = patient_id
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("BrainTumorReport_{}_{}.txt", safe_id, date.format("%Y-%m-%d"))
    }

    pub fn destination(&self, record: &ReportRecord) -> PathBuf {
        self.report_dir
            .join(Self::file_name(&record.patient().id, record.date()))
    }

    pub fn persist(&self, record: &ReportRecord) -> Result<PathBuf, PipelineError> {
        let path = self.destination(record);
        let write_error = |source: std::io::Error| PipelineError::ReportWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.report_dir).map_err(write_error)?;
        if path.exists() {
            log::warn!("Overwriting existing report {}", path.display());
        }
        fs::write(&path, record.render()).map_err(write_error)?;

        log::info!("Report saved as {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::decision::decide;
    use crate::inference::model::{InferenceResult, PredictionSource};
    use shared::{Gender, PatientInfo};
    use tempfile::TempDir;

    fn record(id: &str, probability: f32) -> ReportRecord {
        ReportRecord::assemble(
            PatientInfo::new("Alice", "34", Some(Gender::Female), id),
            "scan.png",
            InferenceResult::new(probability).unwrap(),
            decide(probability),
            PredictionSource::Model,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn file_name_follows_id_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            ReportWriter::file_name("P001", date),
            "BrainTumorReport_P001_2024-03-09.txt"
        );
        assert_eq!(
            ReportWriter::file_name("../etc/passwd", date),
            "BrainTumorReport____etc_passwd_2024-03-09.txt"
        );
    }

    #[test]
    fn persist_creates_directory_and_writes_report() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports"));

        let path = writer.persist(&record("P001", 0.82)).unwrap();
        assert_eq!(
            path,
            dir.path().join("reports/BrainTumorReport_P001_2024-03-09.txt")
        );
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Brain Tumor Detection Report\n"));
        assert!(text.contains("Result       : Tumor Detected"));
    }

    #[test]
    fn persist_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let record = record("P001", 0.82);

        let first_path = writer.persist(&record).unwrap();
        let first = fs::read(&first_path).unwrap();
        let second_path = writer.persist(&record).unwrap();
        let second = fs::read(&second_path).unwrap();

        assert_eq!(first_path, second_path);
        assert_eq!(first, second);
    }

    #[test]
    fn same_patient_and_day_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());

        writer.persist(&record("P001", 0.82)).unwrap();
        let path = writer.persist(&record("P001", 0.10)).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("Tumor Not Detected"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
