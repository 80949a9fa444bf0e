use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{Gate, Owned, ResourceKind};
use crate::server::AppState;
use crate::server::dto::{CreateProjectRequest, UpdateProjectRequest};
use crate::server::response::{ApiError, ApiResponse, ResourceResultExt};
use crate::server::validation::validate_title;
use crate::types::{NewProject, Portfolio, Project};

pub async fn list_projects(
    gate: Gate<Owned<Portfolio>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let projects = gate
        .handle
        .projects(state.store.as_ref())
        .or_resource_err(ResourceKind::Project)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn create_project(
    gate: Gate<Owned<Portfolio>>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    validate_title(&req.title)?;

    let project = NewProject {
        title: req.title,
        description: req.description,
        technologies: req.technologies,
        link: req.link,
        image_url: req.image_url,
        featured: req.featured,
    };

    let project = gate
        .handle
        .create_project(state.store.as_ref(), &project)
        .or_resource_err(ResourceKind::Project)?;

    tracing::info!(
        "User {} created project {}",
        gate.identity.username,
        project.id
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn update_project(
    gate: Gate<Owned<Project>>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProjectRequest>,
) -> impl IntoResponse {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }

    let project = gate
        .handle
        .update(state.store.as_ref(), state.clock.now(), |project| {
            if let Some(title) = req.title {
                project.title = title;
            }
            if let Some(description) = req.description {
                project.description = Some(description);
            }
            if let Some(technologies) = req.technologies {
                project.technologies = Some(technologies);
            }
            if let Some(link) = req.link {
                project.link = Some(link);
            }
            if let Some(image_url) = req.image_url {
                project.image_url = Some(image_url);
            }
            if let Some(featured) = req.featured {
                project.featured = featured;
            }
        })
        .or_resource_err(ResourceKind::Project)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn delete_project(
    gate: Gate<Owned<Project>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let id = gate.handle.get().id;

    gate.handle
        .delete(state.store.as_ref())
        .or_resource_err(ResourceKind::Project)?;

    tracing::info!("User {} deleted project {id}", gate.identity.username);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
