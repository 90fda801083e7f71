// src/models/task.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Tarefa de follow-up ligada a um lead
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub lead_id: Uuid,
    pub assigned_to: Option<Uuid>,
    #[schema(example = "Ligar para confirmar avaliação")]
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    pub lead_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub pending: Option<bool>,
}
