/// Session-level endpoints
///
/// Snapshot, general information, wizard steps, text mirror and the CRD list.

use crate::api::{ApiError, AppState, SessionView};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};

/// Partial update of the general-information form
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralPatch {
    pub domain: Option<String>,
    pub repo: Option<String>,
    pub project_name: Option<String>,
    pub namespaced: Option<bool>,
    /// Raw comma-separated namespace text
    pub namespaces: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextEdit {
    pub text: String,
}

/// Result of a text mirror edit
#[derive(Debug, Serialize)]
pub struct TextEditResponse {
    /// False when the text did not parse; the project was left as it was
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub advanced: bool,
    #[serde(flatten)]
    pub session: SessionView,
}

pub fn create_session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/text", put(edit_text))
        .route("/api/session/general", patch(patch_general))
        .route("/api/session/next", post(next_step))
        .route("/api/session/back", post(previous_step))
        .route("/api/crds", post(add_crd))
        .route("/api/crds/{index}", delete(remove_crd))
        .route("/api/crds/{index}/select", put(select_crd))
}

/// GET /api/session
async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.view().await)
}

/// PUT /api/session/text
/// Body: { "text": "<raw mirror text>" }
///
/// Invalid text is kept in the mirror and reported with `applied: false`; it is
/// not an HTTP error, the user is mid-edit.
async fn edit_text(State(state): State<AppState>, Json(edit): Json<TextEdit>) -> Json<TextEditResponse> {
    let mut session = state.session.lock().await;
    let outcome = session.edit_text(edit.text);
    Json(TextEditResponse {
        applied: outcome.is_ok(),
        error: outcome.err().map(|e| e.to_string()),
        session: SessionView::capture(&session, &state.generator),
    })
}

/// PATCH /api/session/general
/// Body: any of { "domain", "repo", "projectName", "namespaced", "namespaces" }
async fn patch_general(
    State(state): State<AppState>,
    Json(patch): Json<GeneralPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| {
            if let Some(domain) = patch.domain {
                s.set_domain(domain);
            }
            if let Some(repo) = patch.repo {
                s.set_repo(repo);
            }
            if let Some(name) = patch.project_name {
                s.set_project_name(name);
            }
            if let Some(namespaced) = patch.namespaced {
                s.set_namespaced(namespaced);
            }
            if let Some(text) = patch.namespaces {
                s.set_namespaces_text(text);
            }
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/session/next
async fn next_step(State(state): State<AppState>) -> Json<AdvanceResponse> {
    let mut session = state.session.lock().await;
    let advanced = session.advance();
    tracing::debug!("➡️ Advance requested, moved on: {}", advanced);
    Json(AdvanceResponse {
        advanced,
        session: SessionView::capture(&session, &state.generator),
    })
}

/// POST /api/session/back
async fn previous_step(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    session.back();
    Json(SessionView::capture(&session, &state.generator))
}

/// POST /api/crds
async fn add_crd(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| {
            let index = s.add_crd();
            tracing::info!("➕ Added CRD #{}", index);
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/crds/{index}
async fn remove_crd(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| {
            let removed = s.remove_crd(index)?;
            tracing::info!("🗑️ Removed CRD #{} ({})", index, removed.kind);
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

/// PUT /api/crds/{index}/select
async fn select_crd(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| Ok(s.select_crd(index)?)).await?;
    Ok(Json(view))
}
