use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::frame::library::has_image_extension;
use crate::frame::{SharedPlaylist, validate_basename};

/// `image/<ext>` from the lowercased extension, with `jpg` mapped to `jpeg`.
/// Other extensions pass through untouched.
pub fn content_type_for(name: &str) -> String {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let subtype = if ext == "jpg" { "jpeg" } else { ext.as_str() };
    format!("image/{subtype}")
}

/// Map a requested basename onto a picture file, refusing anything that isn't a bare name.
pub fn resolve_picture(playlist: &SharedPlaylist, name: &str) -> Result<PathBuf, StatusCode> {
    let name = validate_basename(name).map_err(|e| {
        warn!(error = %e, "Rejected picture name");
        StatusCode::BAD_REQUEST
    })?;
    let dir = playlist.lock().images().dir().to_path_buf();
    let path = dir.join(name);
    if has_image_extension(&path) && path.is_file() {
        Ok(path)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub fn image_response(name: &str, bytes: Vec<u8>) -> Response {
    let mut resp = Response::new(Body::from(bytes));
    match HeaderValue::from_str(&content_type_for(name)) {
        Ok(value) => {
            resp.headers_mut().insert(header::CONTENT_TYPE, value);
            resp
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.webp"), "image/webp");
    }
}
