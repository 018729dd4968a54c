use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Shown by the page when the annotated image cannot be turned into a JPEG.
pub const ENCODING_ERROR: &str = "Image encoding error!";

#[derive(Error, Debug)]
pub enum WebError {
    #[error("no image uploaded, expected multipart field `image`")]
    MissingImage,
    #[error("malformed upload: {0}")]
    BadMultipart(String),
    #[error("upload is larger than the server accepts")]
    TooLarge,
    #[error("unsupported image format: {0} (use jpg, jpeg or png)")]
    UnsupportedFormat(String),
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("detection failed: {0:#}")]
    Detection(anyhow::Error),
    #[error("Image encoding error!")]
    Encoding,
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::MissingImage | WebError::BadMultipart(_) | WebError::Decode(_) => StatusCode::BAD_REQUEST,
            WebError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WebError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            WebError::Detection(_) | WebError::Encoding | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for WebError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            WebError::TooLarge
        } else {
            WebError::BadMultipart(e.body_text())
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("Rejected upload: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
