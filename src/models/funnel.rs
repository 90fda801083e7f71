// src/models/funnel.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Funil: pipeline ordenado de etapas por onde o lead passa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Funnel {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub unit_id: Option<Uuid>,
    #[schema(example = "Funil de Implantes")]
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStep {
    pub id: Uuid,
    pub funnel_id: Uuid,
    #[schema(example = "Avaliação agendada")]
    pub name: String,
    #[schema(example = 1)]
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelDetail {
    #[serde(flatten)]
    pub funnel: Funnel,
    pub steps: Vec<FunnelStep>,
}
