// src/db/task_repo.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::task::{Task, TaskFilter},
};

const TASK_COLUMNS: &str = r#"
    id, company_id, lead_id, assigned_to, title, due_date, completed, created_at, updated_at
"#;

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_task(
        &self,
        company_id: Uuid,
        lead_id: Uuid,
        assigned_to: Option<Uuid>,
        title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, AppError> {
        let sql = format!(
            r#"
            INSERT INTO tasks (company_id, lead_id, assigned_to, title, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(company_id)
            .bind(lead_id)
            .bind(assigned_to)
            .bind(title)
            .bind(due_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    pub async fn list(&self, company_id: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM tasks
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR lead_id = $2)
              AND ($3::uuid IS NULL OR assigned_to = $3)
              AND ($4::boolean IS NULL OR completed = NOT $4)
            ORDER BY due_date ASC NULLS LAST, created_at ASC
            "#,
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(company_id)
            .bind(filter.lead_id)
            .bind(filter.assigned_to)
            .bind(filter.pending)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    pub async fn mark_completed(&self, company_id: Uuid, id: Uuid) -> Result<Task, AppError> {
        let sql = format!(
            r#"
            UPDATE tasks SET completed = TRUE, updated_at = now()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Tarefa".to_string()))
    }

    pub async fn delete_task(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Tarefa".to_string()));
        }
        Ok(())
    }
}
