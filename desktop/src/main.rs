mod app;
mod form;
mod result_view;

use backend::config::AppConfig;
use backend::inference::model::{ModelFallback, PredictionSource, StubClassifier, load_classifier};
use backend::pipeline::Pipeline;
use backend::report::report_service::ReportWriter;
use std::sync::Arc;

use crate::app::DetectionApp;

fn main() -> eframe::Result {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Invalid configuration ({}), falling back to defaults", e);
        AppConfig::default()
    });

    let classifier = load_classifier(&config.model, ModelFallback::Simulate).unwrap_or_else(|e| {
        log::error!("Model unavailable: {}", e);
        Arc::new(StubClassifier::new(
            config.model.stub_seed,
            config.model.input_shape(),
        ))
    });
    let simulated = classifier.source() == PredictionSource::Simulated;
    if simulated {
        log::warn!("No trained model loaded, results will be simulated");
    }

    let app = DetectionApp::new(
        Pipeline::new(classifier),
        ReportWriter::new(config.storage.report_dir.clone()),
        simulated,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 650.0])
            .with_title("Brain Tumor Detection System"),
        ..Default::default()
    };

    eframe::run_native(
        "Brain Tumor Detection System",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
