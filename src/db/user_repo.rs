// src/db/user_repo.rs

use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::auth::{Role, User},
};

const USER_COLUMNS: &str = r#"
    id, company_id, unit_id, email, password_hash, name, role, specialty, created_at, updated_at
"#;

/// Dados persistidos de um usuário (o hash já vem calculado).
#[derive(Debug, Clone)]
pub struct UserFields {
    pub unit_id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub specialty: Option<String>,
}

impl From<User> for UserFields {
    fn from(user: User) -> Self {
        Self {
            unit_id: user.unit_id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            specialty: user.specialty,
        }
    }
}

/// Vínculos que impedem a exclusão de um usuário.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct UserUsage {
    pub leads: i64,
    pub tasks: i64,
    pub consultas: i64,
}

impl UserUsage {
    pub fn is_empty(&self) -> bool {
        self.leads == 0 && self.tasks == 0 && self.consultas == 0
    }
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (login é global, e-mail é único)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    /// Busca um usuário garantindo que ele pertence à clínica.
    pub async fn find_in_company(&self, company_id: Uuid, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1 AND company_id = $2", USER_COLUMNS);
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE company_id = $1 ORDER BY name ASC",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    // Cria um novo usuário no banco de dados
    // Com tratamento de erro específico para e-mails duplicados.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        fields: &UserFields,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (company_id, unit_id, email, password_hash, name, role, specialty)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(company_id)
            .bind(fields.unit_id)
            .bind(&fields.email)
            .bind(&fields.password_hash)
            .bind(&fields.name)
            .bind(fields.role)
            .bind(&fields.specialty)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::EmailAlreadyExists))
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        fields: &UserFields,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE users
            SET unit_id = $3, email = $4, password_hash = $5, name = $6,
                role = $7, specialty = $8, updated_at = now()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(company_id)
            .bind(fields.unit_id)
            .bind(&fields.email)
            .bind(&fields.password_hash)
            .bind(&fields.name)
            .bind(fields.role)
            .bind(&fields.specialty)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::EmailAlreadyExists))?
            .ok_or(AppError::UserNotFound)
    }

    /// Leads sob responsabilidade do usuário, tarefas pendentes e consultas em que
    /// ele foi o dentista. Tarefas concluídas só perdem o responsável.
    pub async fn count_usage<'e, E>(&self, executor: E, id: Uuid) -> Result<UserUsage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let usage = sqlx::query_as::<_, UserUsage>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM leads WHERE responsible_id = $1) AS leads,
                (SELECT COUNT(*) FROM tasks WHERE assigned_to = $1 AND completed = FALSE) AS tasks,
                (SELECT COUNT(*) FROM consultas WHERE dentista_id = $1) AS consultas
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(usage)
    }

    /// Trava a linha do usuário: inserções que o referenciam (FOR KEY SHARE) esperam.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND company_id = $2 FOR UPDATE",
            USER_COLUMNS
        );
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    pub async fn delete_user<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
