/// In-memory repositories
///
/// Records live in insertion-ordered vectors behind async read/write locks.
/// Behaviour matches the PostgreSQL store: upserting `save`, unique emails,
/// project deletion cascading to tasks, and token lookups that ignore
/// expired tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ProjectRepository, RepoError, RepoResult, StoreHealth, TaskRepository, TokenRepository,
    UserRepository,
};
use crate::models::{project::Project, task::Task, token::Token, user::User};

/// Process-local store implementing every repository
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    projects: RwLock<Vec<Project>>,
    tasks: RwLock<Vec<Task>>,
    tokens: RwLock<Vec<Token>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens, expired ones included
    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }
}

/// Replaces the record with the same ID or appends a new one
fn upsert<T: Clone>(records: &mut Vec<T>, record: &T, same: impl Fn(&T) -> bool) {
    match records.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

fn remove_where<T>(records: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = records.len();
    records.retain(|record| !matches(record));
    records.len() != before
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(RepoError::Duplicate("email".to_string()));
        }

        let mut stored = user.clone();
        stored.updated_at = Utc::now();
        upsert(&mut users, &stored, |u| u.id == user.id);
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn find(&self) -> RepoResult<Vec<Project>> {
        Ok(self.projects.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Project>> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn save(&self, project: &Project) -> RepoResult<()> {
        let mut stored = project.clone();
        stored.updated_at = Utc::now();
        upsert(&mut *self.projects.write().await, &stored, |p| p.id == project.id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let removed = remove_where(&mut *self.projects.write().await, |p| p.id == id);
        if removed {
            remove_where(&mut *self.tasks.write().await, |t| t.project == id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn find_by_project(&self, project_id: Uuid) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.project == project_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Task>> {
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> RepoResult<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn save(&self, task: &Task) -> RepoResult<()> {
        let mut stored = task.clone();
        stored.updated_at = Utc::now();
        upsert(&mut *self.tasks.write().await, &stored, |t| t.id == task.id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(remove_where(&mut *self.tasks.write().await, |t| t.id == id))
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn find_by_hash(&self, token_hash: &str) -> RepoResult<Option<Token>> {
        let now = Utc::now();
        Ok(self
            .tokens
            .read()
            .await
            .iter()
            .rev()
            .find(|t| t.token_hash == token_hash && !t.is_expired_at(now))
            .cloned())
    }

    async fn save(&self, token: &Token) -> RepoResult<()> {
        self.tokens.write().await.push(token.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(remove_where(&mut *self.tokens.write().await, |t| t.id == id))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|t| !t.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}
