use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::catalog::{FontChoice, GENRES, ImageStyle, Language, MetaphorLevel, SONG_STRUCTURES};
use crate::error::{GenerationError, MAX_PERSONA_BYTES};
use crate::flow::FlowEvent;
use crate::generation::SelfTestKind;
use crate::session::Session;
use crate::settings::{LyricsSettingsPatch, ThumbnailSettings};
use crate::thumbnail::EditOutcome;

const INDEX_HTML: &str = include_str!("../templates/index.html");
/// Multipart framing on top of the image itself.
const UPLOAD_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}

fn generation_error(err: &GenerationError) -> Response {
    let status = match err {
        GenerationError::UnsupportedFile(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        GenerationError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    json_error(status, &err.user_message())
}

/// Only a body over the upload limit is reported as an oversized image.
fn upload_rejection(status: StatusCode, detail: &str) -> Response {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return json_error(status, &GenerationError::FileTooLarge(MAX_PERSONA_BYTES + 1).user_message());
    }
    json_error(status, &format!("Could not read the upload: {detail}"))
}

fn multipart_rejection(err: MultipartError) -> Response {
    warn!(error = %err, "persona upload could not be read");
    upload_rejection(err.status(), &err.body_text())
}

/// Every route the page talks to. `/downloads` is mounted by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/catalog", get(catalog))
        .route("/api/session", get(session_snapshot))
        .route("/api/settings/open", post(open_settings))
        .route("/api/settings/close", post(close_settings))
        .route("/api/credential", post(save_credential).delete(remove_credential))
        .route("/api/self-test", post(run_self_test))
        .route("/api/self-test/all", post(run_all_self_tests))
        .route("/api/genre", post(select_genre))
        .route("/api/titles/regenerate", post(regenerate_titles))
        .route("/api/title", post(select_title))
        .route("/api/back", post(back))
        .route("/api/restart", post(restart))
        .route("/api/lyrics/settings", post(update_lyrics_settings))
        .route("/api/generate/suno", post(generate_suno))
        .route("/api/generate/metadata", post(generate_metadata))
        .route("/api/generate/lyrics", post(generate_lyrics))
        .route("/api/generate/thumbnail-prompt", post(generate_thumbnail_prompt))
        .route("/api/generate/thumbnail", post(generate_thumbnail))
        .route("/api/thumbnail/settings", post(update_thumbnail_settings))
        .route("/api/thumbnail/composite", get(thumbnail_composite))
        .route("/api/thumbnail/original", get(thumbnail_original))
        .route(
            "/api/persona",
            post(upload_persona)
                .delete(clear_persona)
                .layer(DefaultBodyLimit::max(MAX_PERSONA_BYTES + UPLOAD_OVERHEAD)),
        )
        .route("/api/export", post(export))
        .with_state(state)
}

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn catalog() -> Response {
    let languages: Vec<_> = Language::ALL
        .iter()
        .map(|lang| json!({ "id": lang, "name": lang.name() }))
        .collect();
    let metaphors: Vec<_> = MetaphorLevel::ALL
        .iter()
        .map(|level| json!({ "id": level, "name": level.label() }))
        .collect();
    let styles: Vec<_> = ImageStyle::ALL
        .iter()
        .map(|style| json!({ "id": style, "name": style.label(), "description": style.description() }))
        .collect();
    let fonts: Vec<_> = FontChoice::ALL
        .iter()
        .map(|font| json!({ "id": font, "name": font.label(), "family": font.family() }))
        .collect();
    Json(json!({
        "genres": GENRES,
        "languages": languages,
        "metaphors": metaphors,
        "structures": SONG_STRUCTURES,
        "imageStyles": styles,
        "fonts": fonts,
    }))
    .into_response()
}

async fn session_snapshot(State(state): State<AppState>) -> Response {
    Json(state.session.snapshot().await).into_response()
}

async fn open_settings(State(state): State<AppState>) -> Response {
    Json(state.session.dispatch(FlowEvent::SettingsOpened).await).into_response()
}

async fn close_settings(State(state): State<AppState>) -> Response {
    let has_credential = state.session.snapshot().await.has_credential;
    Json(state.session.dispatch(FlowEvent::SettingsClosed { has_credential }).await).into_response()
}

#[derive(Deserialize)]
struct CredentialRequest {
    key: String,
}

async fn save_credential(
    State(state): State<AppState>,
    Json(body): Json<CredentialRequest>,
) -> Response {
    if state.session.save_credential(&body.key) {
        Json(json!({ "saved": true, "message": "API key saved." })).into_response()
    } else {
        json_error(StatusCode::BAD_REQUEST, "Please enter an API key.")
    }
}

async fn remove_credential(State(state): State<AppState>) -> Response {
    state.session.remove_credential();
    Json(json!({ "removed": true })).into_response()
}

#[derive(Deserialize)]
struct SelfTestRequest {
    kind: Option<SelfTestKind>,
    key: Option<String>,
}

async fn run_self_test(State(state): State<AppState>, Json(body): Json<SelfTestRequest>) -> Response {
    let Some(kind) = body.kind else {
        return json_error(StatusCode::BAD_REQUEST, "Missing test kind.");
    };
    Json(state.session.run_self_test(kind, body.key.as_deref()).await).into_response()
}

async fn run_all_self_tests(
    State(state): State<AppState>,
    Json(body): Json<SelfTestRequest>,
) -> Response {
    Json(state.session.run_all_self_tests(body.key.as_deref()).await).into_response()
}

#[derive(Deserialize)]
struct GenreRequest {
    genre: String,
}

async fn select_genre(State(state): State<AppState>, Json(body): Json<GenreRequest>) -> Response {
    Json(state.session.dispatch(FlowEvent::GenreSelected(body.genre)).await).into_response()
}

async fn regenerate_titles(State(state): State<AppState>) -> Response {
    Json(state.session.dispatch(FlowEvent::RegenerateTitles).await).into_response()
}

#[derive(Deserialize)]
struct TitleRequest {
    title: String,
}

async fn select_title(State(state): State<AppState>, Json(body): Json<TitleRequest>) -> Response {
    Json(state.session.dispatch(FlowEvent::TitleSelected(body.title)).await).into_response()
}

async fn back(State(state): State<AppState>) -> Response {
    Json(state.session.dispatch(FlowEvent::Back).await).into_response()
}

async fn restart(State(state): State<AppState>) -> Response {
    Json(state.session.dispatch(FlowEvent::Restart).await).into_response()
}

async fn update_lyrics_settings(
    State(state): State<AppState>,
    Json(patch): Json<LyricsSettingsPatch>,
) -> Response {
    Json(state.session.update_lyrics_settings(patch).await).into_response()
}

async fn generate_suno(State(state): State<AppState>) -> Response {
    state.session.generate_suno_prompts().await;
    Json(state.session.snapshot().await).into_response()
}

async fn generate_metadata(State(state): State<AppState>) -> Response {
    state.session.generate_video_metadata().await;
    Json(state.session.snapshot().await).into_response()
}

async fn generate_lyrics(State(state): State<AppState>) -> Response {
    state.session.generate_lyrics().await;
    Json(state.session.snapshot().await).into_response()
}

#[derive(Deserialize, Default)]
struct FeedbackRequest {
    feedback: Option<String>,
}

async fn generate_thumbnail_prompt(
    State(state): State<AppState>,
    body: Option<Json<FeedbackRequest>>,
) -> Response {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    state.session.generate_thumbnail_prompt(body.feedback).await;
    Json(state.session.snapshot().await).into_response()
}

async fn generate_thumbnail(
    State(state): State<AppState>,
    body: Option<Json<FeedbackRequest>>,
) -> Response {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    state.session.generate_thumbnail(body.feedback).await;
    Json(state.session.snapshot().await).into_response()
}

#[derive(Serialize)]
struct EditResponse {
    outcome: &'static str,
}

async fn update_thumbnail_settings(
    State(state): State<AppState>,
    Json(settings): Json<ThumbnailSettings>,
) -> Response {
    let outcome = match state.session.update_thumbnail_settings(settings).await {
        EditOutcome::Applied => "applied",
        EditOutcome::Superseded => "superseded",
        EditOutcome::KeptPrevious => "keptPrevious",
        EditOutcome::NoThumbnail => "noThumbnail",
    };
    Json(EditResponse { outcome }).into_response()
}

fn image_response(mime_type: String, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    )
        .into_response()
}

async fn thumbnail_composite(State(state): State<AppState>) -> Response {
    match state.session.thumbnail() {
        Some(thumbnail) => {
            let image = thumbnail.composite().clone();
            image_response(image.mime_type, image.bytes)
        }
        None => json_error(StatusCode::NOT_FOUND, "No thumbnail yet."),
    }
}

async fn thumbnail_original(State(state): State<AppState>) -> Response {
    match state.session.thumbnail() {
        Some(thumbnail) => {
            let image = thumbnail.original().clone();
            image_response(image.mime_type, image.bytes)
        }
        None => json_error(StatusCode::NOT_FOUND, "No thumbnail yet."),
    }
}

async fn upload_persona(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().unwrap_or("persona").to_string();
                match field.bytes().await {
                    Ok(data) => upload = Some((file_name, content_type, data)),
                    Err(err) => return multipart_rejection(err),
                }
                break;
            }
            Ok(None) => break,
            Err(err) => return multipart_rejection(err),
        }
    }

    let Some((file_name, content_type, data)) = upload else {
        return json_error(StatusCode::BAD_REQUEST, "No file was uploaded.");
    };
    match state
        .session
        .set_persona(&file_name, content_type.as_deref(), data.to_vec())
        .await
    {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => generation_error(&err),
    }
}

async fn clear_persona(State(state): State<AppState>) -> Response {
    state.session.clear_persona().await;
    Json(json!({ "removed": true })).into_response()
}

async fn export(State(state): State<AppState>) -> Response {
    match state.session.export().await {
        Ok(manifest) => Json(manifest).into_response(),
        Err(err) => json_error(StatusCode::CONFLICT, &err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn error_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn only_the_body_limit_reads_as_too_large() {
        let too_large = upload_rejection(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded");
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(error_text(too_large).await.contains("10MB"));

        let broken = upload_rejection(StatusCode::BAD_REQUEST, "incomplete multipart stream");
        assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
        let text = error_text(broken).await;
        assert!(text.contains("incomplete multipart stream"));
        assert!(!text.contains("10MB"));
    }
}
