/// Project/task resolution guards
///
/// Routes under `/api/projects/:projectId` receive their entities already
/// resolved, as typed scope values extracted before the handler runs:
///
/// | Scope            | Path parameters          | Checks |
/// |------------------|--------------------------|--------|
/// | [`ProjectById`]  | `projectId` (project id) | id shape (400), project exists (404) |
/// | [`ProjectScope`] | `projectId`              | project exists (404) |
/// | [`TaskScope`]    | `projectId`, `taskId`    | task id shape (400), project exists (404), task exists (404), task in project (400) |
///
/// # Ordering
///
/// ```text
/// static rules (path shape + body fields, reported together)
///   └─> resolve project
///         └─> resolve task
///               └─> task belongs to project
///                     └─> handler
/// ```
///
/// The first failing step answers the request; later steps and the handler
/// never run. Guards only read.
///
/// # Example
///
/// ```ignore
/// async fn get_task(Scoped(TaskScope { task, .. }): Scoped<TaskScope>) -> Json<Task> {
///     Json(task)
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, OrInternal, ValidationErrorDetail},
    middleware::validation::{extract_form, form_errors, reject_if_any, Form},
};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use std::collections::HashMap;
use uptask_shared::models::{project::Project, task::Task};
use uuid::Uuid;

/// Raw path parameters by name
pub type PathParams = HashMap<String, String>;

/// Entities a route needs resolved from its path
#[async_trait]
pub trait PathScope: Sized + Send {
    /// Shape rules on path parameters, run with the body rules
    fn check(_params: &PathParams) -> Vec<ValidationErrorDetail> {
        Vec::new()
    }

    /// Loads the entities, failing with the guard's error response
    async fn resolve(state: &AppState, params: &PathParams) -> ApiResult<Self>;
}

/// The project named by `:projectId`
#[derive(Debug, Clone)]
pub struct ProjectScope {
    pub project: Project,
}

/// The task named by `:taskId`, checked to belong to `:projectId`
#[derive(Debug, Clone)]
pub struct TaskScope {
    pub project: Project,
    pub task: Task,
}

/// The project addressed directly by id (`/api/projects/:projectId`)
///
/// Unlike [`ProjectScope`], a malformed id is a validation error on the `id`
/// field rather than a 404.
#[derive(Debug, Clone)]
pub struct ProjectById {
    pub project: Project,
}

fn param<'a>(params: &'a PathParams, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

fn is_identifier(raw: &str) -> bool {
    Uuid::parse_str(raw).is_ok()
}

/// Looks up a project by raw id; malformed ids are simply not found
pub async fn resolve_project(state: &AppState, raw_id: &str) -> ApiResult<Project> {
    let not_found = || ApiError::NotFound("Proyecto no encontrado".to_string());
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return Err(not_found());
    };

    state
        .repos
        .projects
        .find_by_id(id)
        .await
        .or_internal("Error al validar el proyecto")?
        .ok_or_else(not_found)
}

/// Looks up a task by raw id; malformed ids are simply not found
pub async fn resolve_task(state: &AppState, raw_id: &str) -> ApiResult<Task> {
    let not_found = || ApiError::NotFound("Tarea no encontrada".to_string());
    let Ok(id) = Uuid::parse_str(raw_id) else {
        return Err(not_found());
    };

    state
        .repos
        .tasks
        .find_by_id(id)
        .await
        .or_internal("Error al validar la tarea")?
        .ok_or_else(not_found)
}

/// Rejects a task reached through a project it does not belong to
pub fn assert_task_belongs_to_project(task: &Task, project: &Project) -> ApiResult<()> {
    if task.belongs_to(project) {
        Ok(())
    } else {
        tracing::debug!(task_id = %task.id, project_id = %project.id, "Task accessed through foreign project");
        Err(ApiError::InvalidOperation("Acción no válida".to_string()))
    }
}

#[async_trait]
impl PathScope for ProjectScope {
    async fn resolve(state: &AppState, params: &PathParams) -> ApiResult<Self> {
        let project = resolve_project(state, param(params, "projectId")).await?;
        Ok(Self { project })
    }
}

#[async_trait]
impl PathScope for TaskScope {
    fn check(params: &PathParams) -> Vec<ValidationErrorDetail> {
        if is_identifier(param(params, "taskId")) {
            Vec::new()
        } else {
            vec![ValidationErrorDetail::new("taskId", "ID no válido")]
        }
    }

    async fn resolve(state: &AppState, params: &PathParams) -> ApiResult<Self> {
        let project = resolve_project(state, param(params, "projectId")).await?;
        let task = resolve_task(state, param(params, "taskId")).await?;
        assert_task_belongs_to_project(&task, &project)?;
        Ok(Self { project, task })
    }
}

#[async_trait]
impl PathScope for ProjectById {
    fn check(params: &PathParams) -> Vec<ValidationErrorDetail> {
        if is_identifier(param(params, "projectId")) {
            Vec::new()
        } else {
            vec![ValidationErrorDetail::new("id", "El ID no es válido")]
        }
    }

    async fn resolve(state: &AppState, params: &PathParams) -> ApiResult<Self> {
        let project = resolve_project(state, param(params, "projectId")).await?;
        Ok(Self { project })
    }
}

async fn path_params(parts: &mut Parts, state: &AppState) -> ApiResult<PathParams> {
    let Path(params) = Path::<PathParams>::from_request_parts(parts, state)
        .await
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    Ok(params)
}

/// Extracts a resolved [`PathScope`] for routes without a body
pub struct Scoped<S>(pub S);

#[async_trait]
impl<S: PathScope> FromRequestParts<AppState> for Scoped<S> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await?;
        reject_if_any(S::check(&params))?;
        S::resolve(state, &params).await.map(Scoped)
    }
}

/// Extracts a resolved [`PathScope`] together with a validated body
///
/// Path shape rules and body rules are reported in one response; resolution
/// only happens once both pass.
pub struct ScopedJson<S, T> {
    pub scope: S,
    pub body: T,
}

#[async_trait]
impl<S: PathScope, T: Form> FromRequest<AppState> for ScopedJson<S, T> {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let params = path_params(&mut parts, state).await?;
        let body = extract_form::<T, AppState>(Request::from_parts(parts, body), state).await?;

        let mut errors = S::check(&params);
        errors.extend(form_errors(&body));
        reject_if_any(errors)?;

        let scope = S::resolve(state, &params).await?;
        Ok(Self { scope, body })
    }
}
