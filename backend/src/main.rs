use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use backend::config::AppConfig;
use backend::inference::model::{ModelFallback, PredictionSource, load_classifier};
use backend::pipeline::Pipeline;
use backend::routes::configure_routes;
use backend::storage::upload_store::UploadStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let fallback = if config.model.allow_stub {
        ModelFallback::Simulate
    } else {
        ModelFallback::Fail
    };
    let classifier = match load_classifier(&config.model, fallback) {
        Ok(classifier) => classifier,
        Err(e) => {
            log::error!("Failed to load model at startup: {}", e);
            return Err(std::io::Error::other(format!("Model loading failed: {}", e)));
        }
    };
    if classifier.source() == PredictionSource::Simulated {
        log::warn!("Serving SIMULATED predictions; responses are flagged with \"simulated\": true");
    }

    let pipeline = Pipeline::new(classifier);
    let uploads = UploadStore::new(config.storage.upload_dir.clone());
    let frontend_dir = config.server.frontend_dir.clone();
    if let Some(dir) = &frontend_dir {
        log::info!("Serving web form from {}", dir.display());
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(uploads.clone()))
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
