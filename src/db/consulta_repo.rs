// src/db/consulta_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::consulta::{Consulta, ConsultaFields, ConsultaFilter},
};

const CONSULTA_COLUMNS: &str = r#"
    id, company_id, lead_id, dentista_id, data_consulta, duracao, procedimentos,
    observacoes, proxima_consulta, created_at, updated_at
"#;

#[derive(Clone)]
pub struct ConsultaRepository {
    pool: PgPool,
}

impl ConsultaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_consulta<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        lead_id: Uuid,
        fields: &ConsultaFields,
    ) -> Result<Consulta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO consultas (
                company_id, lead_id, dentista_id, data_consulta, duracao,
                procedimentos, observacoes, proxima_consulta
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CONSULTA_COLUMNS
        );

        let consulta = sqlx::query_as::<_, Consulta>(&sql)
            .bind(company_id)
            .bind(lead_id)
            .bind(fields.dentista_id)
            .bind(fields.data_consulta)
            .bind(fields.duracao)
            .bind(&fields.procedimentos)
            .bind(&fields.observacoes)
            .bind(fields.proxima_consulta)
            .fetch_one(executor)
            .await?;

        Ok(consulta)
    }

    pub async fn find_in_company(&self, company_id: Uuid, id: Uuid) -> Result<Option<Consulta>, AppError> {
        let sql = format!(
            "SELECT {} FROM consultas WHERE id = $1 AND company_id = $2",
            CONSULTA_COLUMNS
        );
        let consulta = sqlx::query_as::<_, Consulta>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(consulta)
    }

    /// Trava a consulta até o fim da transação de atualização.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Consulta>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM consultas WHERE id = $1 AND company_id = $2 FOR UPDATE",
            CONSULTA_COLUMNS
        );
        let consulta = sqlx::query_as::<_, Consulta>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(consulta)
    }

    pub async fn list(&self, company_id: Uuid, filter: &ConsultaFilter) -> Result<Vec<Consulta>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM consultas
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR lead_id = $2)
              AND ($3::uuid IS NULL OR dentista_id = $3)
              AND ($4::timestamptz IS NULL OR data_consulta >= $4)
              AND ($5::timestamptz IS NULL OR data_consulta < $5)
            ORDER BY data_consulta DESC
            "#,
            CONSULTA_COLUMNS
        );

        let consultas = sqlx::query_as::<_, Consulta>(&sql)
            .bind(company_id)
            .bind(filter.lead_id)
            .bind(filter.dentista_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(consultas)
    }

    pub async fn update_consulta<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        fields: &ConsultaFields,
    ) -> Result<Consulta, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE consultas
            SET dentista_id = $3, data_consulta = $4, duracao = $5, procedimentos = $6,
                observacoes = $7, proxima_consulta = $8, updated_at = now()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            CONSULTA_COLUMNS
        );

        sqlx::query_as::<_, Consulta>(&sql)
            .bind(id)
            .bind(company_id)
            .bind(fields.dentista_id)
            .bind(fields.data_consulta)
            .bind(fields.duracao)
            .bind(&fields.procedimentos)
            .bind(&fields.observacoes)
            .bind(fields.proxima_consulta)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Consulta".to_string()))
    }

    pub async fn delete_consulta<'e, E>(&self, executor: E, company_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM consultas WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Consulta".to_string()));
        }
        Ok(())
    }
}
