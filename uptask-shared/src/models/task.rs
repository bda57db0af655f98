/// Task model
///
/// A task belongs to exactly one project and carries a workflow status.
///
/// # Status values
///
/// ```text
/// pending | onHold | inProgress | underReview | completed
/// ```
///
/// Any status may be set from any other; there is no transition table.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'pending', 'onHold', 'inProgress', 'underReview', 'completed'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     status task_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::project::Project;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,

    /// Blocked or paused
    OnHold,

    /// Being worked on
    InProgress,

    /// Waiting for review
    UnderReview,

    /// Done
    Completed,
}

impl TaskStatus {
    /// All statuses, in workflow order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::OnHold,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Completed,
    ];

    /// Wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::OnHold => "onHold",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::UnderReview => "underReview",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Task name
    pub name: String,

    /// Task description
    pub description: String,

    /// Owning project
    #[sqlx(rename = "project_id")]
    pub project: Uuid,

    /// Workflow status
    pub status: TaskStatus,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task or overwriting its editable fields
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub description: String,
}

/// Task with its project reference expanded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub project: Project,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a pending task owned by `project_id`
    pub fn new(project_id: Uuid, data: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: data.name.trim().to_string(),
            description: data.description.trim().to_string(),
            project: project_id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites name and description in place
    pub fn apply(&mut self, data: NewTask) {
        self.name = data.name.trim().to_string();
        self.description = data.description.trim().to_string();
        self.updated_at = Utc::now();
    }

    /// Sets the workflow status
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Whether this task's project reference names `project`
    ///
    /// Compared on the string form of both identifiers.
    pub fn belongs_to(&self, project: &Project) -> bool {
        self.project.to_string() == project.id.to_string()
    }

    /// Expands the project reference
    pub fn expand(self, project: Project) -> TaskDetail {
        TaskDetail {
            id: self.id,
            name: self.name,
            description: self.description,
            project,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::NewProject;

    #[test]
    fn test_status_parse_and_display() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
        assert_eq!("onHold".parse::<TaskStatus>(), Ok(TaskStatus::OnHold));
        assert!("on_hold".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_camel_case() {
        let json = serde_json::to_string(&TaskStatus::UnderReview).unwrap();
        assert_eq!(json, "\"underReview\"");
    }

    #[test]
    fn test_new_task_defaults_to_pending() {
        let task = Task::new(Uuid::new_v4(), NewTask {
            name: " Write copy ".to_string(),
            description: "Homepage".to_string(),
        });
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.name, "Write copy");
    }

    #[test]
    fn test_belongs_to() {
        let project = Project::new(NewProject {
            project_name: "P".into(),
            client_name: "C".into(),
            description: "D".into(),
        });
        let other = Project::new(NewProject {
            project_name: "Q".into(),
            client_name: "C".into(),
            description: "D".into(),
        });
        let task = Task::new(project.id, NewTask::default());

        assert!(task.belongs_to(&project));
        assert!(!task.belongs_to(&other));
    }

    #[test]
    fn test_expand_embeds_project() {
        let project = Project::new(NewProject::default());
        let task = Task::new(project.id, NewTask::default());
        let detail = task.expand(project.clone());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["project"]["_id"], project.id.to_string());
        assert_eq!(json["status"], "pending");
    }
}
