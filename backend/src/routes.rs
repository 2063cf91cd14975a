use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use shared::{ErrorResponse, PatientInfo};
use std::path::PathBuf;

use crate::error::{FailureClass, PipelineError};
use crate::pipeline::Pipeline;
use crate::storage::upload_store::{MAX_UPLOAD_BYTES, UploadError, UploadStore};

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: Option<PathBuf>) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)));
    if let Some(dir) = frontend_dir {
        cfg.service(Files::new("/", dir).index_file("index.html"));
    }
}

struct UploadedFile {
    data: Vec<u8>,
    file_name: Option<String>,
}

#[derive(Default)]
struct UploadForm {
    name: String,
    age: String,
    gender: String,
    id: String,
    file: Option<UploadedFile>,
}

fn error_json(error: impl Into<String>) -> ErrorResponse {
    ErrorResponse {
        error: error.into(),
    }
}

async fn read_upload(mut payload: Multipart) -> Result<UploadForm, Error> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.extend_from_slice(&chunk?);
            if data.len() > MAX_UPLOAD_BYTES {
                return Err(actix_web::error::ErrorPayloadTooLarge(UploadError::FileTooLarge));
            }
        }

        if field_name == "file" {
            if !data.is_empty() {
                form.file = Some(UploadedFile { data, file_name });
            }
            continue;
        }

        let value = String::from_utf8_lossy(&data).into_owned();
        match field_name.as_str() {
            "name" => form.name = value,
            "age" => form.age = value,
            "gender" => form.gender = value,
            "id" => form.id = value,
            other => log::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(form)
}

fn pipeline_error_response(e: &PipelineError) -> HttpResponse {
    let body = error_json(e.to_string());
    match e.class() {
        FailureClass::BadInput => {
            warn!("Rejected request: {}", e);
            HttpResponse::BadRequest().json(body)
        }
        FailureClass::Unavailable => {
            error!("Model unavailable: {}", e);
            HttpResponse::ServiceUnavailable().json(body)
        }
        FailureClass::Transient => {
            warn!("Inference timed out: {}", e);
            HttpResponse::GatewayTimeout().json(body)
        }
        FailureClass::Unexpected => {
            error!("Unexpected pipeline failure: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

async fn predict(
    pipeline: web::Data<Pipeline>,
    uploads: web::Data<UploadStore>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let form = read_upload(payload).await?;

    let Some(file) = form.file else {
        return Ok(HttpResponse::BadRequest().json(error_json("No file uploaded")));
    };

    let patient = PatientInfo::from_form(&form.name, &form.age, &form.gender, &form.id);
    let missing = patient.missing_fields();
    if !missing.is_empty() {
        return Ok(pipeline_error_response(&PipelineError::IncompleteInput { missing }));
    }

    let store = uploads.clone();
    let stored = web::block(move || store.save(&file.data, file.file_name.as_deref())).await?;
    let image_path = match stored {
        Ok(path) => path,
        Err(UploadError::FileTooLarge) => {
            return Ok(HttpResponse::PayloadTooLarge().json(error_json("File too large")));
        }
        Err(e) => {
            error!("{}", e);
            return Ok(HttpResponse::InternalServerError().json(error_json(e.to_string())));
        }
    };
    info!("Running detection for patient {} on {}", patient.id, image_path.display());

    let runner = pipeline.clone();
    match web::block(move || runner.run(&image_path, patient)).await? {
        Ok(record) => Ok(HttpResponse::Ok().json(record.to_prediction_response())),
        Err(e) => Ok(pipeline_error_response(&e)),
    }
}
