use gloo_net::http::Request;
use shared::{ErrorResponse, PredictionResponse};
use web_sys::{File, FormData};

pub struct PredictionForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub id: String,
    pub file: File,
}

pub async fn send_prediction(form: PredictionForm) -> Result<PredictionResponse, String> {
    let form_data = FormData::new().map_err(|_| "Failed to build form data.".to_string())?;
    for (key, value) in [
        ("name", &form.name),
        ("age", &form.age),
        ("gender", &form.gender),
        ("id", &form.id),
    ] {
        form_data
            .append_with_str(key, value)
            .map_err(|_| format!("Failed to attach field {key}."))?;
    }
    form_data
        .append_with_blob_and_filename("file", &form.file, &form.file.name())
        .map_err(|_| "Failed to attach the image.".to_string())?;

    let response = Request::post("/predict")
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;

    let status = response.status();
    if response.ok() {
        response
            .json::<PredictionResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {e}"))
    } else {
        match response.json::<ErrorResponse>().await {
            Ok(body) => Err(body.error),
            Err(_) => Err(format!("Server returned status {status}")),
        }
    }
}
