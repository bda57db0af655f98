/// Entity models for UpTask
///
/// Plain data records for every persisted entity. Persistence lives in the
/// `repo` module; these types only carry data, invariants and the explicit
/// expansion steps that join related records.
///
/// # Models
///
/// - `user`: Accounts and their confirmation state
/// - `project`: Projects and their ordered task references
/// - `task`: Tasks and the status enum
/// - `token`: Short-lived, single-use confirmation codes
///
/// # Wire format
///
/// Models serialize in camelCase with `_id` as the identifier key, which is
/// the shape the web client consumes.
///
/// # Example
///
/// ```
/// use uptask_shared::models::project::{NewProject, Project};
///
/// let project = Project::new(NewProject {
///     project_name: "Website".to_string(),
///     client_name: "ACME".to_string(),
///     description: "Landing page redesign".to_string(),
/// });
/// assert!(project.tasks.is_empty());
/// ```

pub mod project;
pub mod task;
pub mod token;
pub mod user;
