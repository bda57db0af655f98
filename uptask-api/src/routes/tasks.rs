/// Task endpoints
///
/// All routes live under `/api/projects/:projectId/tasks` and receive their
/// project (and task) already resolved by the guard chain, so an unknown
/// project or task never reaches these handlers.
///
/// # Endpoints
///
/// - `POST   /tasks` - Create a task in the project
/// - `GET    /tasks` - List the project's tasks
/// - `GET    /tasks/:taskId` - Get a task
/// - `PUT    /tasks/:taskId` - Update name and description
/// - `DELETE /tasks/:taskId` - Delete a task
/// - `POST   /tasks/:taskId/status` - Change a task's status
///
/// Creating and deleting a task also rewrites the project's task list. The
/// two writes are issued together and not rolled back if one fails.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrInternal},
    middleware::{
        guard::{ProjectScope, Scoped, ScopedJson, TaskScope},
        validation::{not_blank, violation, Form},
    },
};
use axum::{extract::State, Json};
use serde::Deserialize;
use uptask_shared::models::task::{NewTask, Task, TaskDetail, TaskStatus};
use validator::{Validate, ValidationErrors};

/// Create/update task request
#[derive(Debug, Deserialize, Validate)]
pub struct TaskForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "El nombre de la tarea es requerido"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "La descripción de la tarea es requerida"))]
    pub description: String,
}

impl Form for TaskForm {}

impl From<TaskForm> for NewTask {
    fn from(form: TaskForm) -> Self {
        NewTask {
            name: form.name,
            description: form.description,
        }
    }
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

impl Validate for StatusForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.status.is_empty() {
            errors.add("status", violation("required", "El estado de la tarea es requerido"));
        } else if self.status.parse::<TaskStatus>().is_err() {
            errors.add("status", violation("unknown_status", "Estado no válido"));
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Form for StatusForm {}

/// Creates a task in the project and appends it to the project's list
pub async fn create_task(
    State(state): State<AppState>,
    ScopedJson { scope, body }: ScopedJson<ProjectScope, TaskForm>,
) -> ApiResult<Json<Task>> {
    let mut project = scope.project;
    let task = Task::new(project.id, body.into());
    project.add_task(task.id);

    let (saved_task, saved_project) = tokio::join!(
        state.repos.tasks.save(&task),
        state.repos.projects.save(&project),
    );
    saved_task
        .and(saved_project)
        .or_internal("Error al crear la tarea")?;

    tracing::info!(task_id = %task.id, project_id = %project.id, "Task created");
    Ok(Json(task))
}

/// Lists the project's tasks, each carrying the full project
pub async fn list_tasks(
    State(state): State<AppState>,
    Scoped(ProjectScope { project }): Scoped<ProjectScope>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    let tasks = state
        .repos
        .tasks
        .find_by_project(project.id)
        .await
        .or_internal("Error al obtener las tareas")?;

    Ok(Json(
        tasks
            .into_iter()
            .map(|task| task.expand(project.clone()))
            .collect(),
    ))
}

pub async fn get_task(Scoped(TaskScope { task, .. }): Scoped<TaskScope>) -> Json<Task> {
    Json(task)
}

/// Overwrites the task's name and description
pub async fn update_task(
    State(state): State<AppState>,
    ScopedJson { scope, body }: ScopedJson<TaskScope, TaskForm>,
) -> ApiResult<Json<&'static str>> {
    let mut task = scope.task;
    task.apply(body.into());

    state
        .repos
        .tasks
        .save(&task)
        .await
        .or_internal("Error al actualizar la tarea")?;

    Ok(Json("Tarea actualizada correctamente"))
}

/// Deletes the task and removes exactly its id from the project's list
pub async fn delete_task(
    State(state): State<AppState>,
    Scoped(TaskScope { mut project, task }): Scoped<TaskScope>,
) -> ApiResult<Json<&'static str>> {
    project.remove_task(task.id);

    let (deleted, saved_project) = tokio::join!(
        state.repos.tasks.delete(task.id),
        state.repos.projects.save(&project),
    );
    deleted
        .and(saved_project)
        .or_internal("Error al eliminar la tarea")?;

    tracing::info!(task_id = %task.id, project_id = %project.id, "Task deleted");
    Ok(Json("Tarea eliminada correctamente"))
}

/// Sets the task's status; any status may follow any other
pub async fn update_status(
    State(state): State<AppState>,
    ScopedJson { scope, body }: ScopedJson<TaskScope, StatusForm>,
) -> ApiResult<Json<&'static str>> {
    let status = body
        .status
        .parse::<TaskStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut task = scope.task;
    task.set_status(status);

    state
        .repos
        .tasks
        .save(&task)
        .await
        .or_internal("Error al actualizar el estado de la tarea")?;

    Ok(Json("Estado de la tarea actualizado correctamente"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::validation::form_errors;

    #[test]
    fn test_status_form_rules() {
        let form = |s: &str| StatusForm {
            status: s.to_string(),
        };

        assert!(form_errors(&form("inProgress")).is_empty());
        assert_eq!(form_errors(&form(""))[0].message, "El estado de la tarea es requerido");
        assert_eq!(form_errors(&form("done"))[0].message, "Estado no válido");
    }

    #[test]
    fn test_task_form_reports_both_fields() {
        let errors = form_errors(&TaskForm {
            name: String::new(),
            description: String::new(),
        });
        assert_eq!(errors.len(), 2);
    }
}
