// src/db/funnel_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::funnel::{Funnel, FunnelStep},
};

const FUNNEL_COLUMNS: &str = "id, company_id, unit_id, name, active, created_at, updated_at";
const STEP_COLUMNS: &str = "id, funnel_id, name, position, created_at";

#[derive(Clone)]
pub struct FunnelRepository {
    pool: PgPool,
}

impl FunnelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_funnel<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        unit_id: Option<Uuid>,
        name: &str,
    ) -> Result<Funnel, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO funnels (company_id, unit_id, name) VALUES ($1, $2, $3) RETURNING {}",
            FUNNEL_COLUMNS
        );
        let funnel = sqlx::query_as::<_, Funnel>(&sql)
            .bind(company_id)
            .bind(unit_id)
            .bind(name)
            .fetch_one(executor)
            .await?;
        Ok(funnel)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Funnel>, AppError> {
        let sql = format!(
            "SELECT {} FROM funnels WHERE company_id = $1 AND active ORDER BY name ASC",
            FUNNEL_COLUMNS
        );
        let funnels = sqlx::query_as::<_, Funnel>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(funnels)
    }

    pub async fn find_in_company(&self, company_id: Uuid, id: Uuid) -> Result<Option<Funnel>, AppError> {
        let sql = format!("SELECT {} FROM funnels WHERE id = $1 AND company_id = $2", FUNNEL_COLUMNS);
        let funnel = sqlx::query_as::<_, Funnel>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(funnel)
    }

    /// Insere a etapa na próxima posição livre do funil.
    pub async fn append_step<'e, E>(&self, executor: E, funnel_id: Uuid, name: &str) -> Result<FunnelStep, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO funnel_steps (funnel_id, name, position)
            VALUES ($1, $2, (SELECT COALESCE(MAX(position), 0) + 1 FROM funnel_steps WHERE funnel_id = $1))
            RETURNING {}
            "#,
            STEP_COLUMNS
        );
        sqlx::query_as::<_, FunnelStep>(&sql)
            .bind(funnel_id)
            .bind(name)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |c| AppError::UniqueConstraintViolation(c.to_string())))
    }

    pub async fn list_steps(&self, funnel_id: Uuid) -> Result<Vec<FunnelStep>, AppError> {
        let sql = format!(
            "SELECT {} FROM funnel_steps WHERE funnel_id = $1 ORDER BY position ASC",
            STEP_COLUMNS
        );
        let steps = sqlx::query_as::<_, FunnelStep>(&sql)
            .bind(funnel_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(steps)
    }

    pub async fn find_step(&self, funnel_id: Uuid, step_id: Uuid) -> Result<Option<FunnelStep>, AppError> {
        let sql = format!(
            "SELECT {} FROM funnel_steps WHERE id = $1 AND funnel_id = $2",
            STEP_COLUMNS
        );
        let step = sqlx::query_as::<_, FunnelStep>(&sql)
            .bind(step_id)
            .bind(funnel_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(step)
    }

    /// Primeira etapa do funil, onde um lead novo entra.
    pub async fn first_step(&self, funnel_id: Uuid) -> Result<Option<FunnelStep>, AppError> {
        let sql = format!(
            "SELECT {} FROM funnel_steps WHERE funnel_id = $1 ORDER BY position ASC LIMIT 1",
            STEP_COLUMNS
        );
        let step = sqlx::query_as::<_, FunnelStep>(&sql)
            .bind(funnel_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(step)
    }
}
