use backend::report::models::{REPORT_CONFIDENCE_DECIMALS, ReportRecord};
use egui::{Color32, RichText};

const DETECTED_COLOR: Color32 = Color32::from_rgb(0xdc, 0x26, 0x26);
const CLEAR_COLOR: Color32 = Color32::from_rgb(0x16, 0xa3, 0x4a);
const MUTED_COLOR: Color32 = Color32::from_rgb(0x47, 0x55, 0x69);

/// Display strings for one finished detection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub result_text: String,
    pub color: Color32,
    pub confidence: String,
    pub recommendation: String,
    pub patient_line: String,
    pub simulated: bool,
}

impl ResultSummary {
    pub fn from_record(record: &ReportRecord) -> Self {
        let verdict = record.verdict();
        let patient = record.patient();
        Self {
            result_text: verdict.label().to_string(),
            color: if verdict.is_detected() {
                DETECTED_COLOR
            } else {
                CLEAR_COLOR
            },
            confidence: format!(
                "Confidence: {}",
                record.confidence_label(REPORT_CONFIDENCE_DECIMALS)
            ),
            recommendation: verdict.recommendation().to_string(),
            patient_line: format!(
                "Patient: {} | Age: {} | Gender: {} | ID: {}",
                patient.name,
                patient.age,
                patient.gender_label(),
                patient.id
            ),
            simulated: record.is_simulated(),
        }
    }

    pub fn draw(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new(&self.result_text)
                    .size(22.0)
                    .strong()
                    .color(self.color),
            );
            ui.label(RichText::new(&self.confidence).size(13.0));
            if self.simulated {
                ui.colored_label(
                    Color32::from_rgb(0xd9, 0x77, 0x06),
                    "Simulated result: no trained model is loaded.",
                );
            }
            ui.add_space(10.0);
            ui.label(
                RichText::new(&self.recommendation)
                    .italics()
                    .color(MUTED_COLOR),
            );
            ui.add_space(5.0);
            ui.label(RichText::new(&self.patient_line).size(10.0).color(MUTED_COLOR));
        });
    }
}
