/// PostgreSQL repositories
///
/// `save` is an upsert keyed on the primary key, so the same call persists a
/// newly built record or an edited one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    ProjectRepository, RepoError, RepoResult, StoreHealth, TaskRepository, TokenRepository,
    UserRepository,
};
use crate::models::{project::Project, task::Task, token::Token, user::User};

/// Store implementing every repository over one connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over `pool`
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique-constraint violations to [`RepoError::Duplicate`]
fn map_unique(err: sqlx::Error, field: &str) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepoError::Duplicate(field.to_string());
        }
    }
    RepoError::Database(err)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, confirmed, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, confirmed, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, confirmed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                name = EXCLUDED.name,
                confirmed = EXCLUDED.confirmed,
                updated_at = NOW()
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.confirmed)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "email"))?;

        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for PgStore {
    async fn find(&self) -> RepoResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, project_name, client_name, description, tasks, created_at, updated_at
            FROM projects
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, project_name, client_name, description, tasks, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn save(&self, project: &Project) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, project_name, client_name, description, tasks, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                project_name = EXCLUDED.project_name,
                client_name = EXCLUDED.client_name,
                description = EXCLUDED.description,
                tasks = EXCLUDED.tasks,
                updated_at = NOW()
            "#,
        )
        .bind(project.id)
        .bind(&project.project_name)
        .bind(&project.client_name)
        .bind(&project.description)
        .bind(&project.tasks)
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn find_by_project(&self, project_id: Uuid) -> RepoResult<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, project_id, status, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, project_id, status, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> RepoResult<Vec<Task>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, project_id, status, created_at, updated_at
            FROM tasks
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn save(&self, task: &Task) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, name, description, project_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.project)
        .bind(task.status)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TokenRepository for PgStore {
    async fn find_by_hash(&self, token_hash: &str) -> RepoResult<Option<Token>> {
        let token = sqlx::query_as::<_, Token>(
            r#"
            SELECT id, token_hash, user_id, created_at
            FROM tokens
            WHERE token_hash = $1 AND created_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(token_hash)
        .bind(Token::cutoff(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn save(&self, token: &Token) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, token_hash, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.id)
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM tokens WHERE created_at <= $1")
            .bind(Token::cutoff(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> RepoResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
