use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::artifacts::ArtifactStore;
use crate::config::ServerConfig;
use crate::error::{Result, ServiceError};
use crate::models::{LocationsResponse, PredictRequest, PredictResponse};
use crate::predictor;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/get_location_names").route(web::get().to(get_location_names)))
        .service(web::resource("/predict_home_price").route(web::post().to(predict_home_price)))
        .service(web::resource("/").route(web::get().to(app_page)))
        .service(web::resource("/app.js").route(web::get().to(app_js)))
        .service(web::resource("/app.css").route(web::get().to(app_css)));
}

/// Known locations for the frontend dropdown. Always answers 200: the store
/// repairs missing artifacts itself and falls back to the built-in list.
pub async fn get_location_names(store: web::Data<ArtifactStore>) -> HttpResponse {
    store.ensure_loaded();
    let locations = store.locations();
    debug!("returning {} locations", locations.len());
    HttpResponse::Ok().json(LocationsResponse { locations })
}

/// Price prediction endpoint. Accepts multipart form-data, urlencoded, or
/// JSON bodies; rejects missing or out-of-range fields with 400.
pub async fn predict_home_price(
    req: HttpRequest,
    payload: web::Payload,
    store: web::Data<ArtifactStore>,
) -> Result<HttpResponse> {
    let request = extract_request(&req, payload).await?;
    request.validate()?;

    let estimate = predictor::estimate_price(
        store.get_ref(),
        &request.location,
        request.total_sqft,
        request.bhk,
        request.bath,
    );
    info!(
        "estimated price {} for {:?} ({} sqft, {} bhk, {} bath){}",
        estimate.value(),
        request.location,
        request.total_sqft,
        request.bhk,
        request.bath,
        if estimate.is_fallback() { " [synthetic]" } else { "" },
    );
    Ok(HttpResponse::Ok().json(PredictResponse { estimated_price: estimate.value() }))
}

async fn extract_request(req: &HttpRequest, payload: web::Payload) -> Result<PredictRequest> {
    match req.content_type() {
        "multipart/form-data" => {
            let form = Multipart::new(req.headers(), payload);
            let fields = collect_multipart_fields(form).await?;
            PredictRequest::from_fields(&fields)
        }
        "application/json" => {
            let body = collect_body(payload).await?;
            serde_json::from_slice(&body)
                .map_err(|err| ServiceError::validation(format!("Invalid input parameters: {err}")))
        }
        // urlencoded, and the permissive default for untyped clients
        _ => {
            let body = collect_body(payload).await?;
            let fields: HashMap<String, String> = url::form_urlencoded::parse(&body)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            PredictRequest::from_fields(&fields)
        }
    }
}

async fn collect_body(mut payload: web::Payload) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk
            .map_err(|err| ServiceError::validation(format!("failed to read request body: {err}")))?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn collect_multipart_fields(mut form: Multipart) -> Result<HashMap<String, String>> {
    let mut fields = HashMap::new();
    while let Some(item) = form.next().await {
        let mut field = item
            .map_err(|err| ServiceError::validation(format!("invalid multipart body: {err}")))?;
        let name = field.content_disposition().get_name().map(str::to_owned);
        // Drain the field even when it is unnamed, so the stream can advance.
        let mut value = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|err| ServiceError::validation(format!("invalid multipart body: {err}")))?;
            value.extend_from_slice(&chunk);
        }
        if let Some(name) = name {
            let value = String::from_utf8(value)
                .map_err(|_| ServiceError::validation(format!("field {name} is not valid UTF-8")))?;
            fields.insert(name, value);
        }
    }
    Ok(fields)
}

pub async fn app_page(config: web::Data<ServerConfig>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async(config.static_dir.join("app.html")).await?)
}

pub async fn app_js(config: web::Data<ServerConfig>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async(config.static_dir.join("app.js")).await?)
}

pub async fn app_css(config: web::Data<ServerConfig>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async(config.static_dir.join("app.css")).await?)
}
