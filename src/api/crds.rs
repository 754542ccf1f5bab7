/// Current-CRD editor endpoints
///
/// Basic info, RBAC rules, webhooks, properties and validations of whichever CRD
/// is selected. Items inside a CRD are addressed by position.

use crate::{
    api::{ApiError, AppState, SessionView},
    document::{
        catalog::{format_choices, validation_types, ValueShape, RBAC_PRESETS, RBAC_VERBS},
        FailurePolicy, MatchPolicy, Operation, PropertyType, SideEffects, ValidationValue,
        WebhookType,
    },
    session::{CrdField, RbacField, RbacPage, Session},
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CrdPatch {
    pub group: Option<String>,
    pub version: Option<String>,
    pub kind: Option<String>,
    pub plural: Option<String>,
    pub controller: Option<bool>,
    pub status: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VerbToggle {
    pub verb: String,
    pub enabled: bool,
}

/// Preset is applied first, so explicit fields in the same patch win
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RbacPatch {
    pub preset: Option<String>,
    pub group: Option<String>,
    pub resources: Option<String>,
    pub verbs: Option<String>,
    pub toggle_verb: Option<VerbToggle>,
}

#[derive(Debug, Deserialize)]
pub struct OperationToggle {
    pub operation: Operation,
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookPatch {
    #[serde(rename = "type")]
    pub webhook_type: Option<WebhookType>,
    pub path: Option<String>,
    pub failure_policy: Option<FailurePolicy>,
    pub side_effects: Option<SideEffects>,
    pub match_policy: Option<MatchPolicy>,
    pub operations: Option<Vec<Operation>>,
    pub toggle_operation: Option<OperationToggle>,
    /// Comma-separated resource list
    pub resources: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyPatch {
    pub name: Option<String>,
    /// "" unsets the type
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub show_validation: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidationPatch {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<ValidationValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: usize,
}

pub fn create_crd_routes() -> Router<AppState> {
    Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/crds/current", patch(patch_crd))
        .route("/api/crds/current/rbac", get(get_rbac_page).post(add_rbac_rule))
        .route("/api/crds/current/rbac/{index}", patch(patch_rbac_rule).delete(remove_rbac_rule))
        .route("/api/crds/current/webhooks", post(add_webhook))
        .route("/api/crds/current/webhooks/{index}", patch(patch_webhook).delete(remove_webhook))
        .route("/api/crds/current/properties", post(add_property))
        .route("/api/crds/current/properties/{index}", patch(patch_property).delete(remove_property))
        .route("/api/crds/current/properties/{index}/validations", post(add_validation))
        .route(
            "/api/crds/current/properties/{index}/validations/{validation}",
            patch(patch_validation).delete(remove_validation),
        )
}

/// GET /api/catalog
///
/// Fixed choices the editors offer: RBAC presets and verbs, property types, and
/// per type the validation types with their value shapes and format choices.
async fn get_catalog() -> Json<Value> {
    let by_type: serde_json::Map<String, Value> = PropertyType::ALL
        .into_iter()
        .map(|ty| {
            let validations: Vec<Value> = validation_types(Some(ty))
                .into_iter()
                .map(|kind| json!({ "type": kind, "shape": ValueShape::of(kind) }))
                .collect();
            let entry = json!({ "validations": validations, "formats": format_choices(Some(ty)) });
            (ty.to_string(), entry)
        })
        .collect();
    Json(json!({
        "rbacPresets": RBAC_PRESETS,
        "rbacVerbs": RBAC_VERBS,
        "propertyTypes": PropertyType::ALL,
        "validationTypes": by_type,
    }))
}

/// PATCH /api/crds/current
/// Body: any of { "group", "version", "kind", "plural", "controller", "status" }
async fn patch_crd(
    State(state): State<AppState>,
    Json(patch): Json<CrdPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| {
            let fields = [
                (CrdField::Group, patch.group),
                (CrdField::Version, patch.version),
                (CrdField::Kind, patch.kind),
                (CrdField::Plural, patch.plural),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    s.set_crd_field(field, value)?;
                }
            }
            if let Some(controller) = patch.controller {
                s.set_controller(controller)?;
            }
            if let Some(status) = patch.status {
                s.set_status(status)?;
            }
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

// --------------------------------------------------
// RBAC
// --------------------------------------------------

/// GET /api/crds/current/rbac?page=N
async fn get_rbac_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Json<RbacPage> {
    let session = state.session.lock().await;
    Json(session.rbac_page(query.page))
}

/// POST /api/crds/current/rbac
async fn add_rbac_rule(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.add_rbac_rule().map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

/// PATCH /api/crds/current/rbac/{index}
/// Body: any of { "preset", "group", "resources", "verbs", "toggleVerb": { "verb", "enabled" } }
async fn patch_rbac_rule(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(patch): Json<RbacPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| {
            if let Some(preset) = patch.preset {
                s.apply_rbac_preset(index, &preset)?;
            }
            let fields = [
                (RbacField::Group, patch.group),
                (RbacField::Resources, patch.resources),
                (RbacField::Verbs, patch.verbs),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    s.set_rbac_field(index, field, value)?;
                }
            }
            if let Some(toggle) = patch.toggle_verb {
                s.toggle_rbac_verb(index, &toggle.verb, toggle.enabled)?;
            }
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/crds/current/rbac/{index}
async fn remove_rbac_rule(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.remove_rbac_rule(index).map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

// --------------------------------------------------
// webhooks
// --------------------------------------------------

/// POST /api/crds/current/webhooks
async fn add_webhook(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.add_webhook().map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

/// PATCH /api/crds/current/webhooks/{index}
/// Body: any of { "type", "path", "failurePolicy", "sideEffects", "matchPolicy",
/// "operations", "toggleOperation": { "operation", "enabled" }, "resources" }
async fn patch_webhook(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(patch): Json<WebhookPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| apply_webhook_patch(s, index, patch)).await?;
    Ok(Json(view))
}

fn apply_webhook_patch(s: &mut Session, index: usize, patch: WebhookPatch) -> Result<(), ApiError> {
    if let Some(webhook_type) = patch.webhook_type {
        s.set_webhook_type(index, webhook_type)?;
    }
    if let Some(path) = patch.path {
        s.set_webhook_path(index, path)?;
    }
    if let Some(policy) = patch.failure_policy {
        s.set_failure_policy(index, policy)?;
    }
    if let Some(side_effects) = patch.side_effects {
        s.set_side_effects(index, side_effects)?;
    }
    if let Some(policy) = patch.match_policy {
        s.set_match_policy(index, policy)?;
    }
    if let Some(operations) = patch.operations {
        s.set_webhook_operations(index, operations)?;
    }
    if let Some(toggle) = patch.toggle_operation {
        s.toggle_webhook_operation(index, toggle.operation, toggle.enabled)?;
    }
    if let Some(resources) = patch.resources {
        s.set_webhook_resources_text(index, &resources)?;
    }
    Ok(())
}

/// DELETE /api/crds/current/webhooks/{index}
async fn remove_webhook(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.remove_webhook(index).map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

// --------------------------------------------------
// properties and validations
// --------------------------------------------------

/// POST /api/crds/current/properties
async fn add_property(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.add_property().map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

/// PATCH /api/crds/current/properties/{index}
/// Body: any of { "name", "type", "showValidation" }
async fn patch_property(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(patch): Json<PropertyPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let property_type = match patch.property_type.as_deref().map(str::trim) {
        None => None,
        Some("") => Some(None),
        Some(raw) => Some(Some(raw.parse::<PropertyType>().map_err(ApiError::bad_request)?)),
    };
    let view = state
        .update(|s| {
            if let Some(name) = patch.name {
                s.set_property_name(index, name)?;
            }
            if let Some(property_type) = property_type {
                s.set_property_type(index, property_type)?;
            }
            if let Some(show) = patch.show_validation {
                s.set_show_validation(index, show)?;
            }
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/crds/current/properties/{index}
async fn remove_property(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.remove_property(index).map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

/// POST /api/crds/current/properties/{index}/validations
async fn add_validation(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.update(|s| s.add_validation(index).map(drop).map_err(ApiError::from)).await?;
    Ok(Json(view))
}

/// PATCH /api/crds/current/properties/{index}/validations/{validation}
/// Body: any of { "type", "value" }
async fn patch_validation(
    State(state): State<AppState>,
    Path((index, validation)): Path<(usize, usize)>,
    Json(patch): Json<ValidationPatch>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| {
            if let Some(kind) = patch.kind {
                s.set_validation_type(index, validation, kind)?;
            }
            if let Some(value) = patch.value {
                s.set_validation_value(index, validation, Some(value))?;
            }
            Ok(())
        })
        .await?;
    Ok(Json(view))
}

/// DELETE /api/crds/current/properties/{index}/validations/{validation}
async fn remove_validation(
    State(state): State<AppState>,
    Path((index, validation)): Path<(usize, usize)>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .update(|s| s.remove_validation(index, validation).map(drop).map_err(ApiError::from))
        .await?;
    Ok(Json(view))
}
