/// Repository layer
///
/// One trait per entity, each exposing lookup, `save` (insert or overwrite)
/// and `delete`. Handlers depend on the traits only; two stores implement
/// all of them:
///
/// - [`postgres::PgStore`]: sqlx over PostgreSQL
/// - [`memory::MemoryStore`]: process-local, used by tests and `STORAGE=memory`
///
/// References between entities are plain IDs. Expansion into full records is
/// an explicit step (see `Project::expand` and `Task::expand`).
///
/// # Example
///
/// ```
/// use uptask_shared::models::project::{NewProject, Project};
/// use uptask_shared::repo::Repositories;
///
/// # async fn example() -> Result<(), uptask_shared::repo::RepoError> {
/// let repos = Repositories::in_memory();
/// let project = Project::new(NewProject {
///     project_name: "P1".into(),
///     client_name: "C1".into(),
///     description: "D1".into(),
/// });
/// repos.projects.save(&project).await?;
/// assert!(repos.projects.find_by_id(project.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::token::hash_code;
use crate::models::{project::Project, task::Task, token::Token, user::User};

/// Repository error
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation on the named field
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// Every drawn confirmation code matched a live token
    #[error("No free confirmation code after {0} draws")]
    CodesExhausted(usize),
}

/// Repository result type alias
pub type RepoResult<T> = Result<T, RepoError>;

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Finds a user by (normalized) email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Inserts or overwrites a user
    ///
    /// Fails with [`RepoError::Duplicate`] if another user owns the email.
    async fn save(&self, user: &User) -> RepoResult<()>;
}

/// Project persistence
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// All projects, oldest first
    async fn find(&self) -> RepoResult<Vec<Project>>;

    /// Finds a project by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Project>>;

    /// Inserts or overwrites a project
    async fn save(&self, project: &Project) -> RepoResult<()>;

    /// Deletes a project and its tasks
    ///
    /// Returns false if the project did not exist.
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

/// Task persistence
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks whose `project` is `project_id`, oldest first
    async fn find_by_project(&self, project_id: Uuid) -> RepoResult<Vec<Task>>;

    /// Finds a task by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Task>>;

    /// Finds every task whose ID is in `ids` (any order)
    async fn find_by_ids(&self, ids: &[Uuid]) -> RepoResult<Vec<Task>>;

    /// Inserts or overwrites a task
    async fn save(&self, task: &Task) -> RepoResult<()>;

    /// Deletes a task, returning false if it did not exist
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

/// Token persistence
///
/// Lookups never return a token older than the TTL.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Finds a live token by code digest
    async fn find_by_hash(&self, token_hash: &str) -> RepoResult<Option<Token>>;

    /// Inserts a token
    async fn save(&self, token: &Token) -> RepoResult<()>;

    /// Deletes a token, returning false if it did not exist
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;

    /// Deletes every token expired at `now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;

    /// Finds a live token by the plaintext code
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Token>> {
        self.find_by_hash(&hash_code(code)).await
    }
}

/// Backing-store liveness
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Succeeds if the store can serve requests
    async fn ping(&self) -> RepoResult<()>;
}

/// The full set of repositories handed to request handlers
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Repositories backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(memory::MemoryStore::new()))
    }

    /// Repositories sharing one store that implements every trait
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ProjectRepository
            + TaskRepository
            + TokenRepository
            + StoreHealth
            + 'static,
    {
        Self {
            users: store.clone(),
            projects: store.clone(),
            tasks: store.clone(),
            tokens: store.clone(),
            health: store,
        }
    }
}
