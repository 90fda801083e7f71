// src/models/unit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Código reservado da unidade matriz, criada junto com a clínica.
pub const HEADQUARTERS_CODE: &str = "SEDE";

// Unidade física da clínica
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,

    #[schema(example = "Unidade Centro")]
    pub name: String,

    // Único por clínica, sempre em maiúsculas
    #[schema(example = "CENTRO")]
    pub code: String,

    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub manager_id: Option<Uuid>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    pub fn is_headquarters(&self) -> bool {
        self.code.eq_ignore_ascii_case(HEADQUARTERS_CODE)
    }
}

/// Quantos registros ainda apontam para a unidade.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct UnitUsage {
    pub funnels: i64,
    pub leads: i64,
}

impl UnitUsage {
    pub fn is_empty(&self) -> bool {
        self.funnels == 0 && self.leads == 0
    }
}
