use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use askama::Template;
use tracing::{error, info, warn};

use crate::frame::{FrameError, ScaleMode, validate_basename};

use super::state::{AppState, ShowQuery, StatusResponse};
use super::templates::IndexTemplate;
use super::util::{image_response, resolve_picture};

pub async fn index(State(state): State<AppState>) -> Response {
    let playlist = state.playlist.clone();
    match tokio::task::spawn_blocking(move || playlist.refresh().map_err(|e| e.to_string())).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(error = %e, "Picture refresh failed"),
        Err(e) => warn!(error = %e, "Picture refresh task failed"),
    }

    let (count, scale_mode) = {
        let playlist = state.playlist.lock();
        (playlist.images().len(), playlist.scale_mode())
    };
    let tpl = IndexTemplate {
        count,
        fit_active: scale_mode == ScaleMode::Fit,
        power_supported: state.power.is_supported(),
    };
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Index template failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn next(State(state): State<AppState>) -> StatusCode {
    state.playlist.lock().next_image();
    StatusCode::OK
}

pub async fn prev(State(state): State<AppState>) -> StatusCode {
    state.playlist.lock().previous_image();
    StatusCode::OK
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.playlist.lock().list_images())
}

pub async fn show(State(state): State<AppState>, Query(query): Query<ShowQuery>) -> StatusCode {
    let Some(name) = query.image else {
        return StatusCode::OK;
    };
    if let Err(e) = validate_basename(&name) {
        warn!(error = %e, "Rejected show request");
        return StatusCode::BAD_REQUEST;
    }
    if !state.playlist.lock().show_image(&name) {
        info!(image = %name, "Show request for unknown picture ignored");
    }
    StatusCode::OK
}

pub async fn fit(State(state): State<AppState>) -> StatusCode {
    state.playlist.lock().set_scale_mode(ScaleMode::Fit);
    StatusCode::OK
}

pub async fn fill(State(state): State<AppState>) -> StatusCode {
    state.playlist.lock().set_scale_mode(ScaleMode::Fill);
    StatusCode::OK
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let playlist = state.playlist.lock();
    let images = playlist.images();
    let target_index = (!images.is_empty()).then(|| playlist.target_index());
    Json(StatusResponse {
        count: images.len(),
        target_index,
        target: target_index.and_then(|i| images.name(i)).map(str::to_owned),
        scale_mode: playlist.scale_mode(),
    })
}

#[derive(Clone, Copy, Debug)]
enum PowerAction {
    Shutdown,
    Reboot,
}

pub async fn shutdown(State(state): State<AppState>) -> Response {
    power_action(state, PowerAction::Shutdown).await
}

pub async fn reboot(State(state): State<AppState>) -> Response {
    power_action(state, PowerAction::Reboot).await
}

async fn power_action(state: AppState, action: PowerAction) -> Response {
    if !state.power.is_supported() {
        info!(?action, "Power action ignored on this host");
        return StatusCode::OK.into_response();
    }
    let power = state.power.clone();
    let res = tokio::task::spawn_blocking(move || {
        match action {
            PowerAction::Shutdown => power.shutdown(),
            PowerAction::Reboot => power.reboot(),
        }
        .map_err(|e| format!("{e}"))
    })
    .await
    .map_err(|e| format!("task join error: {e}"))
    .and_then(|r| r);
    match res {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!(?action, error = %e, "Power action failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

pub async fn image(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let path = match resolve_picture(&state.playlist, &name) {
        Ok(p) => p,
        Err(status) => return status.into_response(),
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => image_response(&name, bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed reading picture");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn thumbnail(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let source = match resolve_picture(&state.playlist, &name) {
        Ok(p) => p,
        Err(status) => return status.into_response(),
    };
    let store = state.thumbnails.clone();
    let res = tokio::task::spawn_blocking(move || {
        store
            .ensure(&source)
            .and_then(|thumb| Ok::<_, FrameError>(std::fs::read(&thumb.path)?))
            .map_err(|e| format!("{e}"))
    })
    .await
    .map_err(|e| format!("task join error: {e}"))
    .and_then(|r| r);
    match res {
        Ok(bytes) => image_response(&name, bytes),
        Err(e) => {
            error!(image = %name, error = %e, "Thumbnail generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
