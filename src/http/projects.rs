//! Project management handlers
//!
//! Handles project creation, listing, update and deletion.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::extract::{JsonBody, PathParam, QueryParams};
use super::handlers::TextResponse;
use crate::error::{Result, StudioError};
use crate::project::{NewProject, Project, ProjectUpdate};
use crate::state::AppState;
use crate::subtitle;

/// List of projects
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub count: usize,
    pub projects: Vec<Project>,
}

/// Query parameters for project listing
#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Create a new project
/// POST /api/projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<NewProject>,
) -> Result<impl IntoResponse> {
    let project = state.projects.create(request).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// List projects
/// GET /api/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ProjectListQuery>,
) -> Json<ProjectListResponse> {
    let projects = state.projects.list(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(usize::MAX),
    );

    Json(ProjectListResponse {
        count: projects.len(),
        projects,
    })
}

/// Get project details
/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<Project>> {
    Ok(Json(state.projects.get(id)?))
}

/// Update a project
/// PATCH /api/projects/{id}
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(update): JsonBody<ProjectUpdate>,
) -> Result<Json<Project>> {
    Ok(Json(state.projects.update(id, update).await?))
}

/// Delete a project and its audio
/// DELETE /api/projects/{id}
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<StatusCode> {
    let project = state.projects.delete(id).await?;

    if let Some(key) = project.audio_key {
        match state.audio.delete(&key).await {
            Ok(()) | Err(StudioError::ObjectNotFound(_)) => {}
            Err(e) => tracing::warn!("Failed to delete audio {} of project {}: {}", key, id, e),
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Plain-text view of the project script
/// GET /api/projects/{id}/preview
pub async fn preview_project(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<TextResponse>> {
    let project = state.projects.get(id)?;
    Ok(Json(TextResponse {
        text: subtitle::normalize(&project.script),
    }))
}
