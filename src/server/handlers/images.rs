//! Photo upload and crop API handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{ApiError, ApiResult, parse_id};
use crate::crop::{self, CropSpec, SourceImage};
use crate::error::CollageError;
use crate::server::state::AppState;

/// Response from the upload and crop endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

fn default_center() -> f64 {
    0.5
}

/// Request body for the crop endpoint: either an explicit rectangle or a
/// zoom selection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CropRequest {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    #[serde(rename_all = "camelCase")]
    Zoom {
        zoom: f64,
        #[serde(default = "default_center")]
        center_x: f64,
        #[serde(default = "default_center")]
        center_y: f64,
    },
}

impl CropRequest {
    /// Client rectangles must lie inside the photo.
    fn to_spec(&self, source: &SourceImage) -> Result<CropSpec, CollageError> {
        match *self {
            CropRequest::Rect {
                x,
                y,
                width,
                height,
            } => {
                let spec = CropSpec::new(x, y, width, height);
                if !spec.is_within(source.width(), source.height()) {
                    return Err(CollageError::validation(format!(
                        "crop rectangle {},{} {}x{} is outside the {}x{} image",
                        x,
                        y,
                        width,
                        height,
                        source.width(),
                        source.height()
                    )));
                }
                Ok(spec)
            }
            CropRequest::Zoom {
                zoom,
                center_x,
                center_y,
            } => Ok(CropSpec::from_zoom(
                source.width(),
                source.height(),
                zoom,
                (center_x, center_y),
            )),
        }
    }
}

async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, CollageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CollageError::render(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// POST /api/images - Upload a photo (multipart field `image`).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImageResponse>> {
    let mut image_data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read image: {}", e)))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }
    let bytes = image_data.ok_or_else(|| ApiError::bad_request("No image field found"))?;

    let id = Uuid::new_v4();
    let source = blocking(move || SourceImage::decode(id.to_string(), &bytes)).await?;
    let (width, height) = (source.width(), source.height());
    state.insert_source(id, source).await;

    info!(%id, width, height, "image uploaded");
    Ok(Json(ImageResponse {
        id: id.to_string(),
        width,
        height,
    }))
}

/// POST /api/images/:id/crop - Confirm the crop for an uploaded photo.
pub async fn crop(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<CropRequest>, JsonRejection>,
) -> ApiResult<Json<ImageResponse>> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let source = state
        .source(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Image not found or expired"))?;

    let spec = request.to_spec(&source)?;
    let cropped = blocking(move || crop::crop(&source, &spec)?.persist()).await?;
    let rect = spec.snap();
    state.insert_crop(id, cropped).await;

    info!(%id, width = rect.width, height = rect.height, "crop confirmed");
    Ok(Json(ImageResponse {
        id: id.to_string(),
        width: rect.width,
        height: rect.height,
    }))
}

/// GET /api/images/:id/cropped - The persisted crop as a JPEG.
pub async fn cropped(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let image = state
        .crop(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Crop not found or expired"))?;
    let jpeg = blocking(move || image.to_jpeg()).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg))
}
