/// Generation endpoints
///
/// The server has no save dialog, so archives land in the configured download
/// directory.

use crate::{
    api::{ApiError, AppState, GenerationView},
    submit::{GeneratedArchive, NoDialog},
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};

pub fn create_generate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/generate/status", get(generation_status))
}

/// POST /api/generate
///
/// Submits the text mirror as it currently reads. Returns where the archive was
/// saved; 409 while another generation is running.
async fn generate(State(state): State<AppState>) -> Result<Json<GeneratedArchive>, ApiError> {
    // Snapshot the text, then release the session for the duration of the request
    let text = state.session.lock().await.mirror_text().to_string();

    let archive = state.generator.generate(&text, &NoDialog).await?;
    Ok(Json(archive))
}

/// GET /api/generate/status
async fn generation_status(State(state): State<AppState>) -> Json<GenerationView> {
    Json(GenerationView::of(&state.generator))
}
