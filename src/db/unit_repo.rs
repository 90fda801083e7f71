// src/db/unit_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::unit::{Unit, UnitUsage},
};

const UNIT_COLUMNS: &str = r#"
    id, company_id, name, code, address, phone, email, manager_id, active, created_at, updated_at
"#;

/// Colunas editáveis de uma unidade.
#[derive(Debug, Clone)]
pub struct UnitFields {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub manager_id: Option<Uuid>,
}

impl From<Unit> for UnitFields {
    fn from(unit: Unit) -> Self {
        Self {
            name: unit.name,
            code: unit.code,
            address: unit.address,
            phone: unit.phone,
            email: unit.email,
            manager_id: unit.manager_id,
        }
    }
}

#[derive(Clone)]
pub struct UnitRepository {
    pool: PgPool,
}

impl UnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_company(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<Unit>, AppError> {
        let sql = format!(
            "SELECT {} FROM units WHERE company_id = $1 AND (active OR $2) ORDER BY name ASC",
            UNIT_COLUMNS
        );
        let units = sqlx::query_as::<_, Unit>(&sql)
            .bind(company_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
        Ok(units)
    }

    /// Unidades geridas por um MANAGER.
    pub async fn list_managed_by(
        &self,
        company_id: Uuid,
        manager_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Unit>, AppError> {
        let sql = format!(
            r#"
            SELECT {} FROM units
            WHERE company_id = $1 AND manager_id = $2 AND (active OR $3)
            ORDER BY name ASC
            "#,
            UNIT_COLUMNS
        );
        let units = sqlx::query_as::<_, Unit>(&sql)
            .bind(company_id)
            .bind(manager_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
        Ok(units)
    }

    pub async fn find_in_company(&self, company_id: Uuid, id: Uuid) -> Result<Option<Unit>, AppError> {
        let sql = format!("SELECT {} FROM units WHERE id = $1 AND company_id = $2", UNIT_COLUMNS);
        let unit = sqlx::query_as::<_, Unit>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(unit)
    }

    pub async fn create_unit<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        fields: &UnitFields,
    ) -> Result<Unit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO units (company_id, name, code, address, phone, email, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            UNIT_COLUMNS
        );

        sqlx::query_as::<_, Unit>(&sql)
            .bind(company_id)
            .bind(&fields.name)
            .bind(&fields.code)
            .bind(&fields.address)
            .bind(&fields.phone)
            .bind(&fields.email)
            .bind(fields.manager_id)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::UnitCodeAlreadyExists(fields.code.clone())))
    }

    pub async fn update_unit(&self, company_id: Uuid, id: Uuid, fields: &UnitFields) -> Result<Unit, AppError> {
        let sql = format!(
            r#"
            UPDATE units
            SET name = $3, code = $4, address = $5, phone = $6, email = $7,
                manager_id = $8, updated_at = now()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            UNIT_COLUMNS
        );

        sqlx::query_as::<_, Unit>(&sql)
            .bind(id)
            .bind(company_id)
            .bind(&fields.name)
            .bind(&fields.code)
            .bind(&fields.address)
            .bind(&fields.phone)
            .bind(&fields.email)
            .bind(fields.manager_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::UnitCodeAlreadyExists(fields.code.clone())))?
            .ok_or_else(|| AppError::ResourceNotFound("Unidade".to_string()))
    }

    /// Exclusão lógica: a unidade apenas deixa de estar ativa.
    pub async fn deactivate(&self, company_id: Uuid, id: Uuid) -> Result<Unit, AppError> {
        let sql = format!(
            r#"
            UPDATE units SET active = FALSE, updated_at = now()
            WHERE id = $1 AND company_id = $2
            RETURNING {}
            "#,
            UNIT_COLUMNS
        );

        sqlx::query_as::<_, Unit>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Unidade".to_string()))
    }

    pub async fn count_usage(&self, id: Uuid) -> Result<UnitUsage, AppError> {
        let usage = sqlx::query_as::<_, UnitUsage>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM funnels WHERE unit_id = $1) AS funnels,
                (SELECT COUNT(*) FROM leads WHERE unit_id = $1) AS leads
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(usage)
    }
}
