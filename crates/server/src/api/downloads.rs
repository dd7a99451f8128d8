//! Download handlers: single processed files and whole-batch archives.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use pressroom_core::ServiceError;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/downloads/{cache_id}/{index}
///
/// Stream one processed file. An index that is not a number is not found.
pub async fn download_item(
    State(state): State<Arc<AppState>>,
    Path((cache_id, index)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let index: usize = index
        .parse()
        .map_err(|_| ServiceError::InvalidIndex { index })?;
    let item = state.service().fetch_one(&cache_id, index).await?;

    debug!("Streaming '{}' ({} bytes)", item.name, item.size);

    let content_type = content_type_for(item.storage_ref.extension().as_deref());
    Ok(attachment(
        Body::from_stream(ReaderStream::new(item.file)),
        content_type,
        item.size,
        &item.name,
    ))
}

/// GET /api/v1/downloads/{cache_id}/archive
///
/// Stream every processed file of a batch as one zip.
pub async fn download_archive(
    State(state): State<Arc<AppState>>,
    Path(cache_id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.service().fetch_all(&cache_id).await?;

    debug!(
        "Streaming archive '{}' ({} bytes)",
        download.name, download.archive.size
    );

    Ok(attachment(
        Body::from_stream(ReaderStream::new(download.archive.file)),
        "application/zip",
        download.archive.size,
        &download.name,
    ))
}

fn attachment(body: Body, content_type: &'static str, size: u64, name: &str) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
