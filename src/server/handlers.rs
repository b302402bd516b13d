use super::upload::StagedUpload;
use super::{ApiError, AppState};
use crate::schema::ProductRecord;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

const NO_IMAGE: &str = "No image provided";
const NO_SELECTED_FILE: &str = "No selected file";

/// Name of the multipart part carrying the photo.
const IMAGE_FIELD: &str = "image";

struct ImageUpload {
    filename: String,
    bytes: Vec<u8>,
}

pub(super) async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductRecord>, ApiError> {
    // A body that is not multipart at all cannot contain the field.
    let Ok(multipart) = multipart else {
        return Err(ApiError::bad_request(NO_IMAGE));
    };
    let upload = read_image_field(multipart).await?;
    info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "Received image"
    );

    let staged = StagedUpload::write(&state.upload_dir, &upload.filename, &upload.bytes).await?;
    let result = state.extractor.extract_file(staged.path()).await;
    drop(staged);

    Ok(Json(result?))
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Find the first file part named `image`.
///
/// Parts without a filename are plain form values and are skipped; a file
/// part with an empty filename means the client submitted the form without
/// choosing a file.
async fn read_image_field(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if filename.is_empty() {
            return Err(ApiError::bad_request(NO_SELECTED_FILE));
        }
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(ImageUpload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::bad_request(NO_IMAGE))
}

fn multipart_error(e: MultipartError) -> ApiError {
    let status = e.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("upload rejected: {}", e.body_text());
    }
    ApiError::new(status, e.body_text())
}
