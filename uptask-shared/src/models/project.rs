/// Project model
///
/// A project owns an ordered list of task references. The list mirrors the
/// tasks whose `project` field points back at this project: task creation
/// appends the new ID, task deletion removes it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     project_name VARCHAR(255) NOT NULL,
///     client_name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     tasks UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;

/// Project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project ID
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Project name
    pub project_name: String,

    /// Client the project is for
    pub client_name: String,

    /// Free-form description
    pub description: String,

    /// Ordered task references
    pub tasks: Vec<Uuid>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or overwriting a project's editable fields
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,
}

/// Project with its task references expanded into full tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Builds a new project with no tasks
    pub fn new(data: NewProject) -> Self {
        let now = Utc::now();
        let mut project = Self {
            id: Uuid::new_v4(),
            project_name: String::new(),
            client_name: String::new(),
            description: String::new(),
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        project.apply(data);
        project
    }

    /// Overwrites the editable fields in place
    pub fn apply(&mut self, data: NewProject) {
        self.project_name = data.project_name.trim().to_string();
        self.client_name = data.client_name.trim().to_string();
        self.description = data.description.trim().to_string();
        self.updated_at = Utc::now();
    }

    /// Appends a task reference
    pub fn add_task(&mut self, task_id: Uuid) {
        self.tasks.push(task_id);
        self.updated_at = Utc::now();
    }

    /// Removes every reference to `task_id`, leaving other references untouched
    ///
    /// Returns true if anything was removed.
    pub fn remove_task(&mut self, task_id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|id| *id != task_id);
        let removed = self.tasks.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Expands task references into the given task records
    ///
    /// Order follows the project's reference list. References with no
    /// matching record are skipped.
    pub fn expand(self, mut tasks: Vec<Task>) -> ProjectDetail {
        let expanded = self
            .tasks
            .iter()
            .filter_map(|id| {
                tasks
                    .iter()
                    .position(|task| task.id == *id)
                    .map(|idx| tasks.swap_remove(idx))
            })
            .collect();

        ProjectDetail {
            id: self.id,
            project_name: self.project_name,
            client_name: self.client_name,
            description: self.description,
            tasks: expanded,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
