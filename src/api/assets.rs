//! Embedded static assets
//!
//! In development, falls back to serving from the filesystem.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

const ASSET_DIR: &str = "static";

#[derive(Embed)]
#[folder = "static"]
struct Assets;

fn file_response(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        data,
    )
        .into_response()
}

/// Serve embedded static files, with filesystem fallback for development
pub async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path().trim_start_matches('/');
    if path.split('/').any(|segment| segment == "..") {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    if let Some(content) = Assets::get(path) {
        return file_response(path, content.data.into_owned());
    }

    let fs_path = PathBuf::from(ASSET_DIR).join(path);
    if let Ok(content) = tokio::fs::read(&fs_path).await {
        return file_response(path, content);
    }

    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// The chat page (embedded or from the filesystem)
pub fn get_index_html() -> Option<String> {
    if let Some(content) = Assets::get("index.html") {
        return String::from_utf8(content.data.into_owned()).ok();
    }

    std::fs::read_to_string(PathBuf::from(ASSET_DIR).join("index.html")).ok()
}
