use backend::error::{FailureClass, PipelineError};
use backend::pipeline::Pipeline;
use backend::report::models::ReportRecord;
use backend::report::report_service::ReportWriter;
use eframe::App;
use egui::{Color32, RichText, TextureHandle};
use shared::{Gender, IntoEnumIterator, PatientInfo};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::form::{MISSING_INFO_WARNING, PatientForm};
use crate::result_view::ResultSummary;

const PREVIEW_SIZE: u32 = 300;
const MAX_LOG_LINES: usize = 50;

type AnalysisOutcome = Result<ReportRecord, PipelineError>;

/// Runs one detection off the UI thread. The receiver yields exactly one outcome.
pub fn spawn_analysis(
    pipeline: Pipeline,
    image_path: PathBuf,
    patient: PatientInfo,
) -> io::Result<Receiver<AnalysisOutcome>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("analysis".to_string())
        .spawn(move || {
            // The window may have closed in the meantime.
            let _ = tx.send(pipeline.run(&image_path, patient));
        })?;
    Ok(rx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    PatientEntry,
    Result,
}

struct Preview {
    texture: TextureHandle,
}

struct Outcome {
    record: ReportRecord,
    summary: ResultSummary,
}

pub struct DetectionApp {
    pipeline: Pipeline,
    writer: ReportWriter,
    simulated: bool,
    tab: Tab,
    form: PatientForm,
    preview: Option<Preview>,
    outcome: Option<Outcome>,
    pending: Option<Receiver<AnalysisOutcome>>,
    status: Option<String>,
    log: Vec<String>,
}

impl DetectionApp {
    pub fn new(pipeline: Pipeline, writer: ReportWriter, simulated: bool) -> Self {
        Self {
            pipeline,
            writer,
            simulated,
            tab: Tab::PatientEntry,
            form: PatientForm::default(),
            preview: None,
            outcome: None,
            pending: None,
            status: None,
            log: Vec::new(),
        }
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() >= MAX_LOG_LINES {
            self.log.remove(0);
        }
        self.log.push(line);
    }

    fn load_preview(&mut self, ctx: &egui::Context) {
        let Some(path) = self.form.image_path() else {
            self.status = Some("Choose an MRI image first.".to_string());
            return;
        };
        match preview_image(&path) {
            Ok(image) => {
                let texture = ctx.load_texture("mri_preview", image, egui::TextureOptions::default());
                self.preview = Some(Preview { texture });
                self.status = None;
            }
            Err(e) => {
                self.preview = None;
                self.push_log(format!("Could not open {}: {}", path.display(), e));
                self.status = Some("The selected file is not a readable image.".to_string());
            }
        }
    }

    fn analyze(&mut self) {
        if self.pending.is_some() {
            return;
        }
        if !self.form.is_complete() || self.preview.is_none() {
            self.status = Some(MISSING_INFO_WARNING.to_string());
            return;
        }
        let Some(path) = self.form.image_path() else {
            return;
        };

        match spawn_analysis(self.pipeline.clone(), path, self.form.patient()) {
            Ok(rx) => {
                self.pending = Some(rx);
                self.status = Some("Analyzing...".to_string());
            }
            Err(e) => {
                self.status = Some("Analysis failed unexpectedly.".to_string());
                self.push_log(format!("Could not start analysis: {}", e));
            }
        }
    }

    fn poll_analysis(&mut self) {
        let received = match &self.pending {
            Some(rx) => rx.try_recv(),
            None => return,
        };
        match received {
            Ok(Ok(record)) => {
                self.pending = None;
                let summary = ResultSummary::from_record(&record);
                self.outcome = Some(Outcome { record, summary });
                self.status = None;
                self.tab = Tab::Result;
            }
            Ok(Err(e)) => {
                self.pending = None;
                self.status = Some(failure_message(&e));
                self.push_log(e.to_string());
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.status = Some("Analysis failed unexpectedly.".to_string());
                self.push_log("Analysis thread stopped without a result".to_string());
            }
        }
    }

    fn save_report(&mut self) {
        let Some(outcome) = &self.outcome else {
            return;
        };
        match self.writer.persist(&outcome.record) {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.status = Some(format!("Report saved as {}", name));
            }
            Err(e) => {
                self.status = Some("Could not save the report.".to_string());
                self.push_log(e.to_string());
            }
        }
    }

    fn new_test(&mut self) {
        self.form.clear();
        self.preview = None;
        self.outcome = None;
        self.pending = None;
        self.status = None;
        self.tab = Tab::PatientEntry;
    }

    fn draw_patient_entry(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("Patient Information");
        ui.add_space(8.0);

        egui::Grid::new("patient_form")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Full Name");
                ui.text_edit_singleline(&mut self.form.name);
                ui.end_row();

                ui.label("Age");
                ui.text_edit_singleline(&mut self.form.age);
                ui.end_row();

                ui.label("Gender");
                let selected = self
                    .form
                    .gender
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "Select".to_string());
                egui::ComboBox::from_id_salt("gender")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for gender in Gender::iter() {
                            ui.selectable_value(&mut self.form.gender, Some(gender), gender.to_string());
                        }
                    });
                ui.end_row();

                ui.label("Patient ID");
                ui.text_edit_singleline(&mut self.form.id);
                ui.end_row();

                ui.label("MRI Image");
                ui.horizontal(|ui| {
                    let response = ui.text_edit_singleline(&mut self.form.image_path);
                    if response.changed() {
                        self.preview = None;
                    }
                    if ui.button("Load Image").clicked() {
                        self.load_preview(ctx);
                    }
                });
                ui.end_row();
            });

        ui.add_space(10.0);
        if let Some(preview) = &self.preview {
            let size = PREVIEW_SIZE as f32;
            ui.add(egui::Image::new(&preview.texture).max_size(egui::vec2(size, size)));
            ui.add_space(10.0);
        }

        let busy = self.pending.is_some();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.preview.is_some() && !busy, egui::Button::new("Analyze MRI"))
                .clicked()
            {
                self.analyze();
            }
            if busy {
                ui.spinner();
            }
        });
    }

    fn draw_result(&mut self, ui: &mut egui::Ui) {
        let Some(outcome) = &self.outcome else {
            ui.label("No analysis yet.");
            return;
        };
        ui.add_space(20.0);
        outcome.summary.draw(ui);
        ui.add_space(20.0);

        let mut save = false;
        let mut reset = false;
        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                save = ui.button("Save Report").clicked();
                reset = ui.button("New Test").clicked();
            });
        });
        if save {
            self.save_report();
        }
        if reset {
            self.new_test();
        }
    }
}

impl App for DetectionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_analysis();
        if self.pending.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::PatientEntry, "Patient Entry");
                if self.outcome.is_some() {
                    ui.selectable_value(&mut self.tab, Tab::Result, "Result");
                }
                if self.simulated {
                    ui.separator();
                    ui.colored_label(Color32::from_rgb(0xd9, 0x77, 0x06), "Simulation mode");
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            if let Some(status) = &self.status {
                ui.label(RichText::new(status).strong());
            }
            if !self.log.is_empty() {
                egui::CollapsingHeader::new(format!("Errors ({})", self.log.len()))
                    .default_open(false)
                    .show(ui, |ui| {
                        egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                            for line in &self.log {
                                ui.colored_label(Color32::RED, line);
                            }
                        });
                    });
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::PatientEntry => self.draw_patient_entry(ui, ctx),
            Tab::Result => self.draw_result(ui),
        });
    }
}

fn preview_image(path: &Path) -> Result<egui::ColorImage, image::ImageError> {
    let image = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .resize(PREVIEW_SIZE, PREVIEW_SIZE, image::imageops::FilterType::Triangle)
        .to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

fn failure_message(e: &PipelineError) -> String {
    match e.class() {
        FailureClass::BadInput => format!("Invalid input: {}", e),
        FailureClass::Unavailable => "The detection model is unavailable.".to_string(),
        FailureClass::Transient => "Analysis took too long, please try again.".to_string(),
        FailureClass::Unexpected => "Analysis failed unexpectedly.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::inference::model::StubClassifier;
    use backend::inference::preprocess::InputShape;
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn stub_pipeline() -> Pipeline {
        Pipeline::new(Arc::new(StubClassifier::new(1, InputShape::square(32))))
    }

    fn scan(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("scan.png");
        RgbImage::from_pixel(64, 64, Rgb([80, 80, 80])).save(&path).unwrap();
        path
    }

    #[test]
    fn analysis_result_arrives_through_receiver() {
        let dir = TempDir::new().unwrap();
        let patient = PatientInfo::from_form("Alice", "34", "Female", "P001");

        let rx = spawn_analysis(stub_pipeline(), scan(&dir), patient).unwrap();
        let record = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();

        assert!(record.is_simulated());
        assert_eq!(record.patient().id, "P001");
    }

    #[test]
    fn analysis_errors_arrive_through_receiver() {
        let dir = TempDir::new().unwrap();
        let patient = PatientInfo::from_form("Alice", "34", "Female", "");

        let rx = spawn_analysis(stub_pipeline(), scan(&dir), patient).unwrap();
        let err = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap_err();

        assert!(matches!(err, PipelineError::IncompleteInput { .. }));
    }

    #[test]
    fn failure_messages_follow_class() {
        let missing = PipelineError::IncompleteInput {
            missing: vec!["id"],
        };
        assert_eq!(
            failure_message(&missing),
            "Invalid input: Missing required fields: id"
        );
        assert_eq!(
            failure_message(&PipelineError::InferenceTimeout(Duration::from_secs(30))),
            "Analysis took too long, please try again."
        );
    }
}
