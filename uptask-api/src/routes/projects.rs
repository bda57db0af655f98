/// Project endpoints
///
/// # Endpoints
///
/// - `POST   /api/projects` - Create a project
/// - `GET    /api/projects` - List projects (task ids only)
/// - `GET    /api/projects/:id` - Get a project with its tasks expanded
/// - `PUT    /api/projects/:id` - Update name, client and description
/// - `DELETE /api/projects/:id` - Delete a project and its tasks

use crate::{
    app::AppState,
    error::{ApiResult, OrInternal},
    middleware::{
        guard::{ProjectById, Scoped, ScopedJson},
        validation::{not_blank, Form, ValidJson},
    },
    routes::MessageResponse,
};
use axum::{extract::State, Json};
use serde::Deserialize;
use uptask_shared::models::project::{NewProject, Project, ProjectDetail};
use validator::Validate;

/// Create/update project request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "El nombre del proyecto es requerido"))]
    pub project_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "El nombre del cliente es requerido"))]
    pub client_name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "La descripción es requerida"))]
    pub description: String,
}

impl Form for ProjectForm {
    fn wire_name(field: &str) -> String {
        match field {
            "project_name" => "projectName".to_string(),
            "client_name" => "clientName".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ProjectForm> for NewProject {
    fn from(form: ProjectForm) -> Self {
        NewProject {
            project_name: form.project_name,
            client_name: form.client_name,
            description: form.description,
        }
    }
}

/// Creates a project with an empty task list
///
/// # Errors
///
/// - `400 Bad Request`: a field is empty (all violations listed)
/// - `500 Internal Server Error`: storage failure
pub async fn create_project(
    State(state): State<AppState>,
    ValidJson(form): ValidJson<ProjectForm>,
) -> ApiResult<Json<Project>> {
    let project = Project::new(form.into());

    state
        .repos
        .projects
        .save(&project)
        .await
        .or_internal("Error al crear el proyecto")?;

    tracing::info!(project_id = %project.id, "Project created");
    Ok(Json(project))
}

/// Lists every project
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    let projects = state
        .repos
        .projects
        .find()
        .await
        .or_internal("Error al obtener los proyectos")?;

    Ok(Json(projects))
}

/// Returns a project with `tasks` expanded to full task records
///
/// Tasks keep the project's list order; ids with no stored task are skipped.
pub async fn get_project(
    State(state): State<AppState>,
    Scoped(ProjectById { project }): Scoped<ProjectById>,
) -> ApiResult<Json<ProjectDetail>> {
    let tasks = state
        .repos
        .tasks
        .find_by_ids(&project.tasks)
        .await
        .or_internal("Error al obtener el proyecto")?;

    Ok(Json(project.expand(tasks)))
}

/// Overwrites the project's name, client and description
pub async fn update_project(
    State(state): State<AppState>,
    ScopedJson { scope, body }: ScopedJson<ProjectById, ProjectForm>,
) -> ApiResult<Json<MessageResponse>> {
    let mut project = scope.project;
    project.apply(body.into());

    state
        .repos
        .projects
        .save(&project)
        .await
        .or_internal("Error al actualizar el proyecto")?;

    Ok(Json(MessageResponse::new("Proyecto actualizado correctamente")))
}

/// Deletes the project; its tasks go with it
pub async fn delete_project(
    State(state): State<AppState>,
    Scoped(ProjectById { project }): Scoped<ProjectById>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .repos
        .projects
        .delete(project.id)
        .await
        .or_internal("Error al eliminar el proyecto")?;

    tracing::info!(project_id = %project.id, "Project deleted");
    Ok(Json(MessageResponse::new("Proyecto eliminado correctamente")))
}
