// src/db/lead_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadFields, LeadFilter},
};

const LEAD_COLUMNS: &str = r#"
    id, company_id, unit_id, funnel_id, step_id, responsible_id, phone, name,
    status_venda, valor_orcamento, data_consulta, duracao_consulta, tags,
    created_at, updated_at
"#;

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_lead<'e, E>(&self, executor: E, company_id: Uuid, fields: &LeadFields) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO leads (
                company_id, unit_id, funnel_id, step_id, responsible_id, phone, name,
                status_venda, valor_orcamento, data_consulta, duracao_consulta, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );

        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(company_id)
            .bind(fields.unit_id)
            .bind(fields.funnel_id)
            .bind(fields.step_id)
            .bind(fields.responsible_id)
            .bind(&fields.phone)
            .bind(&fields.name)
            .bind(fields.status_venda)
            .bind(fields.valor_orcamento)
            .bind(fields.data_consulta)
            .bind(fields.duracao_consulta)
            .bind(&fields.tags)
            .fetch_one(executor)
            .await?;

        Ok(lead)
    }

    pub async fn find_in_company(&self, company_id: Uuid, id: Uuid) -> Result<Option<Lead>, AppError> {
        let sql = format!("SELECT {} FROM leads WHERE id = $1 AND company_id = $2", LEAD_COLUMNS);
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    /// Mesma busca, mas trava a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM leads WHERE id = $1 AND company_id = $2 FOR UPDATE",
            LEAD_COLUMNS
        );
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(lead)
    }

    pub async fn list(&self, company_id: Uuid, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM leads
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR unit_id = $2)
              AND ($3::uuid IS NULL OR funnel_id = $3)
              AND ($4::sale_status IS NULL OR status_venda = $4)
            ORDER BY created_at DESC
            "#,
            LEAD_COLUMNS
        );

        let leads = sqlx::query_as::<_, Lead>(&sql)
            .bind(company_id)
            .bind(filter.unit_id)
            .bind(filter.funnel_id)
            .bind(filter.status_venda)
            .fetch_all(&self.pool)
            .await?;
        Ok(leads)
    }

    pub async fn update_lead<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        fields: &LeadFields,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE leads
            SET unit_id = $3, funnel_id = $4, step_id = $5, responsible_id = $6,
                phone = $7, name = $8, status_venda = $9, valor_orcamento = $10,
                data_consulta = $11, duracao_consulta = $12, tags = $13,
                updated_at = now()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );

        sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(company_id)
            .bind(fields.unit_id)
            .bind(fields.funnel_id)
            .bind(fields.step_id)
            .bind(fields.responsible_id)
            .bind(&fields.phone)
            .bind(&fields.name)
            .bind(fields.status_venda)
            .bind(fields.valor_orcamento)
            .bind(fields.data_consulta)
            .bind(fields.duracao_consulta)
            .bind(&fields.tags)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))
    }

    /// Sobrescreve a data/duração da próxima consulta no lead (ou limpa, com None).
    pub async fn set_appointment<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        data_consulta: Option<DateTime<Utc>>,
        duracao_consulta: Option<i32>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE leads
            SET data_consulta = $2, duracao_consulta = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(lead_id)
        .bind(data_consulta)
        .bind(duracao_consulta)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn delete_lead(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Lead".to_string()));
        }
        Ok(())
    }
}
