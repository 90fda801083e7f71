// src/services/funnel_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FunnelRepository, UnitRepository},
    models::{
        auth::User,
        funnel::{Funnel, FunnelDetail, FunnelStep},
    },
};

#[derive(Clone)]
pub struct FunnelService {
    funnel_repo: FunnelRepository,
    unit_repo: UnitRepository,
    pool: PgPool,
}

impl FunnelService {
    pub fn new(funnel_repo: FunnelRepository, unit_repo: UnitRepository, pool: PgPool) -> Self {
        Self { funnel_repo, unit_repo, pool }
    }

    /// Cria o funil e as etapas iniciais na ordem recebida, numa transação.
    pub async fn create_funnel(
        &self,
        actor: &User,
        name: &str,
        unit_id: Option<Uuid>,
        steps: &[String],
    ) -> Result<FunnelDetail, AppError> {
        if !actor.role.can_manage() {
            return Err(AppError::Forbidden);
        }

        if let Some(unit_id) = unit_id {
            let unit = self.unit_repo
                .find_in_company(actor.company_id, unit_id)
                .await?
                .ok_or_else(|| AppError::InvalidReference("unitId".to_string()))?;
            if !unit.active {
                return Err(AppError::InvalidReference("unitId".to_string()));
            }
        }

        let mut tx = self.pool.begin().await?;

        let funnel = self.funnel_repo
            .create_funnel(&mut *tx, actor.company_id, unit_id, name.trim())
            .await?;

        let mut created_steps: Vec<FunnelStep> = Vec::with_capacity(steps.len());
        for step_name in steps {
            let step = self.funnel_repo
                .append_step(&mut *tx, funnel.id, step_name.trim())
                .await?;
            created_steps.push(step);
        }

        tx.commit().await?;

        Ok(FunnelDetail { funnel, steps: created_steps })
    }

    pub async fn list_funnels(&self, company_id: Uuid) -> Result<Vec<Funnel>, AppError> {
        self.funnel_repo.list_by_company(company_id).await
    }

    pub async fn get_funnel(&self, company_id: Uuid, id: Uuid) -> Result<FunnelDetail, AppError> {
        let funnel = self.find_funnel(company_id, id).await?;
        let steps = self.funnel_repo.list_steps(funnel.id).await?;
        Ok(FunnelDetail { funnel, steps })
    }

    pub async fn add_step(&self, actor: &User, funnel_id: Uuid, name: &str) -> Result<FunnelStep, AppError> {
        if !actor.role.can_manage() {
            return Err(AppError::Forbidden);
        }

        let funnel = self.find_funnel(actor.company_id, funnel_id).await?;
        self.funnel_repo.append_step(&self.pool, funnel.id, name.trim()).await
    }

    async fn find_funnel(&self, company_id: Uuid, id: Uuid) -> Result<Funnel, AppError> {
        self.funnel_repo
            .find_in_company(company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Funil".to_string()))
    }
}
