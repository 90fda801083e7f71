// src/services/task_service.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, TaskRepository, UserRepository},
    models::task::{Task, TaskFilter},
};

#[derive(Clone)]
pub struct TaskService {
    task_repo: TaskRepository,
    lead_repo: LeadRepository,
    user_repo: UserRepository,
}

impl TaskService {
    pub fn new(task_repo: TaskRepository, lead_repo: LeadRepository, user_repo: UserRepository) -> Self {
        Self { task_repo, lead_repo, user_repo }
    }

    pub async fn create_task(
        &self,
        company_id: Uuid,
        lead_id: Uuid,
        assigned_to: Option<Uuid>,
        title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, AppError> {
        self.lead_repo
            .find_in_company(company_id, lead_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))?;

        if let Some(user_id) = assigned_to {
            self.user_repo
                .find_in_company(company_id, user_id)
                .await?
                .ok_or_else(|| AppError::InvalidReference("assignedTo".to_string()))?;
        }

        self.task_repo
            .create_task(company_id, lead_id, assigned_to, title.trim(), due_date)
            .await
    }

    pub async fn list_tasks(&self, company_id: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        self.task_repo.list(company_id, filter).await
    }

    pub async fn complete_task(&self, company_id: Uuid, id: Uuid) -> Result<Task, AppError> {
        self.task_repo.mark_completed(company_id, id).await
    }

    pub async fn delete_task(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.task_repo.delete_task(company_id, id).await
    }
}
