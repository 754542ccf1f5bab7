/// HTTP API Layer
///
/// JSON endpoints a browser front-end drives the wizard through. It handles:
/// - Session snapshot, general information and wizard steps
/// - Text mirror edits
/// - CRD list and current-CRD editors (RBAC, webhooks, properties, validations)
/// - Archive generation
///
/// Every mutating endpoint answers with the full session view, so the client never
/// has to reconcile partial state.

// Session, general info, steps, text mirror and CRD list
pub mod session;

// Current-CRD editors
pub mod crds;

// Generation trigger and progress
pub mod generate;

pub use crds::create_crd_routes;
pub use generate::create_generate_routes;
pub use session::create_session_routes;

use crate::{
    document::mirror::MirrorError,
    session::{EditError, Session, WizardStep},
    submit::{Generator, Progress, SubmitError},
    validate::{TouchedSet, ValidationReport},
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// The one wizard session this server drives
    pub session: Arc<Mutex<Session>>,
    /// Generation client; owns the in-flight flag
    pub generator: Arc<Generator>,
}

impl AppState {
    pub fn new(session: Session, generator: Generator) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            generator: Arc::new(generator),
        }
    }

    /// Apply `edit` to a copy of the session and commit only if it succeeds, so a
    /// multi-field patch is all-or-nothing.
    pub async fn update<F>(&self, edit: F) -> Result<SessionView, ApiError>
    where
        F: FnOnce(&mut Session) -> Result<(), ApiError>,
    {
        let mut session = self.session.lock().await;
        let mut draft = session.clone();
        edit(&mut draft)?;
        *session = draft;
        Ok(SessionView::capture(&session, &self.generator))
    }

    pub async fn view(&self) -> SessionView {
        let session = self.session.lock().await;
        SessionView::capture(&session, &self.generator)
    }
}

/// Generation status as shown next to the trigger
#[derive(Debug, Clone, Serialize)]
pub struct GenerationView {
    pub busy: bool,
    pub progress: Progress,
}

impl GenerationView {
    pub fn of(generator: &Generator) -> Self {
        Self {
            busy: generator.is_busy(),
            progress: generator.progress(),
        }
    }
}

/// Everything a front-end needs to render the wizard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub step: WizardStep,
    pub current_crd_index: Option<usize>,
    pub document: Value,
    pub text: String,
    /// Errors for touched fields only
    pub errors: ValidationReport,
    pub touched: TouchedSet,
    /// Properties of the current CRD whose validation editor is expanded
    pub expanded_properties: Vec<usize>,
    pub generation: GenerationView,
}

impl SessionView {
    pub fn capture(session: &Session, generator: &Generator) -> Self {
        let expanded_properties = session
            .current_crd()
            .map(|crd| {
                crd.properties
                    .iter()
                    .enumerate()
                    .filter(|(_, prop)| prop.show_validation)
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            step: session.step(),
            current_crd_index: session.current_index(),
            document: session.document(),
            text: session.mirror_text().to_string(),
            errors: session.visible_errors(),
            touched: session.touched().clone(),
            expanded_properties,
            generation: GenerationView::of(generator),
        }
    }
}

/// Error body: `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<EditError> for ApiError {
    fn from(e: EditError) -> Self {
        let status = match e {
            EditError::OutOfRange { .. } => StatusCode::NOT_FOUND,
            EditError::NoCurrentCrd => StatusCode::CONFLICT,
            EditError::UnknownPreset(_) | EditError::UnknownVerb(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<MirrorError> for ApiError {
    fn from(e: MirrorError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        let status = match e {
            SubmitError::Busy | SubmitError::Cancelled => StatusCode::CONFLICT,
            SubmitError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            SubmitError::Backend { .. } | SubmitError::Transport(_) => StatusCode::BAD_GATEWAY,
            SubmitError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_errors_map_to_status() {
        let e = ApiError::from(EditError::OutOfRange { what: "webhook", index: 3, len: 1 });
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.message, "webhook index 3 out of range (len 1)");
        assert_eq!(ApiError::from(EditError::NoCurrentCrd).status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_backend_error_keeps_body() {
        let e = ApiError::from(SubmitError::Backend { status: 500, body: "boom".to_string() });
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
        assert_eq!(e.message, "Generation failed: boom");
    }

    #[tokio::test]
    async fn test_failed_update_is_not_committed() {
        let state = AppState::new(Session::new(), Generator::new("http://127.0.0.1:9", "."));
        let result = state
            .update(|s| {
                s.set_domain("example.com");
                s.remove_property(7)?;
                Ok(())
            })
            .await;
        assert_eq!(result.unwrap_err().status, StatusCode::NOT_FOUND);
        assert_eq!(state.session.lock().await.project().domain, "");
    }
}
