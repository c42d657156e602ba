//! Collage preview and export API handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResult, parse_id};
use crate::crop::CroppedImage;
use crate::design::DesignConfig;
use crate::export::{ExportFormat, export_blocking};
use crate::preview::{PreviewImage, render_html};
use crate::render::collage::{EXPORT_SCALE, render};
use crate::server::state::AppState;

/// Request body for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// Image ids in top-to-bottom order.
    pub images: Vec<String>,
    #[serde(default)]
    pub design: DesignConfig,
}

/// Request body for the export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub images: Vec<String>,
    #[serde(default)]
    pub design: DesignConfig,
    #[serde(default)]
    pub format: ExportFormat,
}

fn cropped_url(id: &str) -> String {
    format!("/api/images/{}/cropped", id)
}

/// Resolve ids to confirmed crops, keeping request order.
async fn lookup_crops(state: &AppState, ids: &[String]) -> ApiResult<Vec<CroppedImage>> {
    let mut crops = Vec::with_capacity(ids.len());
    for raw in ids {
        let id = parse_id(raw)?;
        let image = state
            .crop(&id)
            .await
            .ok_or_else(|| ApiError::not_found(format!("No confirmed crop for image '{}'", raw)))?;
        crops.push(image);
    }
    Ok(crops)
}

/// POST /api/collage/preview - HTML fragment of the live preview.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> ApiResult<Html<String>> {
    let Json(request) = payload?;
    lookup_crops(&state, &request.images).await?;

    let images: Vec<PreviewImage> = request
        .images
        .iter()
        .map(|id| PreviewImage::new(id.clone(), cropped_url(id)))
        .collect();
    let html = render_html(&images, &request.design.with_capped_text())?;
    Ok(Html(html))
}

/// POST /api/collage/export - Render at export scale and download.
pub async fn export(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let images = lookup_crops(&state, &request.images).await?;
    let design = request.design.with_capped_text();

    let raster = render(&images, &design, EXPORT_SCALE, &state.fonts).await?;
    let artifact = export_blocking(raster, request.format).await?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    ))
}
