// src/models/consulta.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Consulta registrada para um lead
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Consulta {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub lead_id: Uuid,
    pub dentista_id: Uuid,

    pub data_consulta: DateTime<Utc>,
    // Minutos
    #[schema(example = 60)]
    pub duracao: i32,

    #[schema(example = json!(["limpeza", "raio-x panorâmico"]))]
    pub procedimentos: Vec<String>,
    pub observacoes: Option<String>,

    // Quando preenchida, é espelhada em Lead.data_consulta
    pub proxima_consulta: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Colunas gravadas em insert/update, já convertidas e validadas.
#[derive(Debug, Clone)]
pub struct ConsultaFields {
    pub dentista_id: Uuid,
    pub data_consulta: DateTime<Utc>,
    pub duracao: i32,
    pub procedimentos: Vec<String>,
    pub observacoes: Option<String>,
    pub proxima_consulta: Option<DateTime<Utc>>,
}

impl From<Consulta> for ConsultaFields {
    fn from(c: Consulta) -> Self {
        Self {
            dentista_id: c.dentista_id,
            data_consulta: c.data_consulta,
            duracao: c.duracao,
            procedimentos: c.procedimentos,
            observacoes: c.observacoes,
            proxima_consulta: c.proxima_consulta,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConsultaFilter {
    pub lead_id: Option<Uuid>,
    pub dentista_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
