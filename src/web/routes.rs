use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderName, HeaderValue};
use axum::response::{Html, IntoResponse, Json, Response};
use image::{ImageFormat, RgbImage};
use serde::Serialize;

use crate::annotate::encode_jpeg;
use crate::common::PedDetection;
use crate::theme::Theme;
use crate::web::error::WebError;
use crate::web::page::{render_index, DOWNLOAD_NAME};
use crate::web::AppState;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "image";

static PERSONS_HEADER: HeaderName = HeaderName::from_static("x-persons-detected");

#[derive(Debug, Serialize)]
pub struct DetectionsResponse {
    pub width: u32,
    pub height: u32,
    pub persons: usize,
    pub detections: Vec<PedDetection>,
}

pub async fn index() -> Html<String> {
    Html(render_index(Theme::current()))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn detect(State(state): State<AppState>, multipart: Multipart) -> Result<Response, WebError> {
    let upload = read_upload(multipart).await?;
    let annotated = state.annotate_upload(upload).await?;
    let persons = annotated.persons;

    let quality = state.jpeg_quality;
    let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&annotated.image, quality))
        .await
        .map_err(|e| WebError::Internal(e.to_string()))?
        .map_err(|e| {
            log::error!("JPEG encoding failed: {e}");
            WebError::Encoding
        })?;

    let disposition = format!("attachment; filename=\"{DOWNLOAD_NAME}\"");
    let disposition = HeaderValue::from_str(&disposition).map_err(|e| WebError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CONTENT_DISPOSITION, disposition),
            (PERSONS_HEADER.clone(), HeaderValue::from(persons)),
        ],
        jpeg,
    )
        .into_response())
}

pub async fn detections(State(state): State<AppState>, multipart: Multipart) -> Result<Json<DetectionsResponse>, WebError> {
    let upload = read_upload(multipart).await?;
    let annotated = state.annotate_upload(upload).await?;
    let (width, height) = annotated.image.dimensions();
    let detections: Vec<PedDetection> = annotated.person_detections().cloned().collect();

    Ok(Json(DetectionsResponse {
        width,
        height,
        persons: detections.len(),
        detections,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, WebError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(WebError::MissingImage);
        }
        return Ok(data);
    }
    Err(WebError::MissingImage)
}

/// Only JPEG and PNG are accepted; the format is sniffed from the bytes, not the file name.
pub fn decode_upload(bytes: &[u8]) -> Result<RgbImage, WebError> {
    let format = image::guess_format(bytes).map_err(|_| WebError::UnsupportedFormat("unrecognised data".to_string()))?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png => {}
        other => return Err(WebError::UnsupportedFormat(format!("{other:?}"))),
    }
    let image = image::load_from_memory_with_format(bytes, format).map_err(|e| WebError::Decode(e.to_string()))?;
    Ok(image.to_rgb8())
}
