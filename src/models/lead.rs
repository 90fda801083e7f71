// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Mapeia o CREATE TYPE sale_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Novo,
    Agendado,
    EmNegociacao,
    Fechado,
    Perdido,
}

// O paciente (ou potencial paciente) dentro do funil de vendas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub funnel_id: Option<Uuid>,
    pub step_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,

    #[schema(example = "+5511999998888")]
    pub phone: String,
    #[schema(example = "Maria da Silva")]
    pub name: String,

    pub status_venda: SaleStatus,

    #[schema(value_type = Option<f64>, example = 1500.0)]
    pub valor_orcamento: Option<Decimal>,

    // Espelho da próxima consulta (mantido pelo módulo de consultas)
    pub data_consulta: Option<DateTime<Utc>>,
    #[schema(example = 60)]
    pub duracao_consulta: Option<i32>,

    #[schema(example = json!(["implante", "indicação"]))]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Colunas gravadas em insert/update, já validadas pelo serviço.
#[derive(Debug, Clone)]
pub struct LeadFields {
    pub unit_id: Option<Uuid>,
    pub funnel_id: Option<Uuid>,
    pub step_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub phone: String,
    pub name: String,
    pub status_venda: SaleStatus,
    pub valor_orcamento: Option<Decimal>,
    pub data_consulta: Option<DateTime<Utc>>,
    pub duracao_consulta: Option<i32>,
    pub tags: Vec<String>,
}

impl From<Lead> for LeadFields {
    fn from(lead: Lead) -> Self {
        Self {
            unit_id: lead.unit_id,
            funnel_id: lead.funnel_id,
            step_id: lead.step_id,
            responsible_id: lead.responsible_id,
            phone: lead.phone,
            name: lead.name,
            status_venda: lead.status_venda,
            valor_orcamento: lead.valor_orcamento,
            data_consulta: lead.data_consulta,
            duracao_consulta: lead.duracao_consulta,
            tags: lead.tags,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LeadFilter {
    pub unit_id: Option<Uuid>,
    pub funnel_id: Option<Uuid>,
    pub status_venda: Option<SaleStatus>,
}
