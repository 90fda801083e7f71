// src/services/lead_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, patch::Patch},
    db::{FunnelRepository, LeadRepository, UnitRepository, UserRepository},
    models::{
        auth::User,
        lead::{Lead, LeadFields, LeadFilter, SaleStatus},
    },
};

#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub unit_id: Option<Uuid>,
    pub funnel_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub status_venda: Option<SaleStatus>,
    pub valor_orcamento: Option<Decimal>,
    pub data_consulta: Option<DateTime<Utc>>,
    pub duracao_consulta: Option<i32>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeadChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status_venda: Option<SaleStatus>,
    pub tags: Option<Vec<String>>,
    pub unit_id: Patch<Uuid>,
    pub funnel_id: Patch<Uuid>,
    pub responsible_id: Patch<Uuid>,
    pub valor_orcamento: Patch<Decimal>,
    pub data_consulta: Patch<DateTime<Utc>>,
    pub duracao_consulta: Patch<i32>,
}

/// Mantém só dígitos (e o '+' inicial): "(11) 99999-8888" -> "11999998888".
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if trimmed.starts_with('+') {
        format!("+{}", digits)
    } else {
        digits
    }
}

/// Tags sem espaços nas pontas, minúsculas, sem vazias nem repetidas.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Clone)]
pub struct LeadService {
    lead_repo: LeadRepository,
    unit_repo: UnitRepository,
    funnel_repo: FunnelRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl LeadService {
    pub fn new(
        lead_repo: LeadRepository,
        unit_repo: UnitRepository,
        funnel_repo: FunnelRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { lead_repo, unit_repo, funnel_repo, user_repo, pool }
    }

    pub async fn create_lead(&self, actor: &User, new_lead: NewLead) -> Result<Lead, AppError> {
        let company_id = actor.company_id;
        self.check_references(company_id, new_lead.unit_id, new_lead.funnel_id, new_lead.responsible_id)
            .await?;

        // Lead novo entra na primeira etapa do funil
        let step_id = match new_lead.funnel_id {
            Some(funnel_id) => self.funnel_repo.first_step(funnel_id).await?.map(|s| s.id),
            None => None,
        };

        let fields = LeadFields {
            unit_id: new_lead.unit_id,
            funnel_id: new_lead.funnel_id,
            step_id,
            responsible_id: new_lead.responsible_id,
            phone: normalize_phone(&new_lead.phone),
            name: new_lead.name.trim().to_string(),
            status_venda: new_lead.status_venda.unwrap_or(SaleStatus::Novo),
            valor_orcamento: new_lead.valor_orcamento,
            data_consulta: new_lead.data_consulta,
            duracao_consulta: new_lead.duracao_consulta,
            tags: normalize_tags(new_lead.tags),
        };

        let lead = self.lead_repo.create_lead(&self.pool, company_id, &fields).await?;
        tracing::info!(company_id = %company_id, lead_id = %lead.id, "📇 Lead criado");
        Ok(lead)
    }

    pub async fn list_leads(&self, company_id: Uuid, filter: &LeadFilter) -> Result<Vec<Lead>, AppError> {
        self.lead_repo.list(company_id, filter).await
    }

    pub async fn get_lead(&self, company_id: Uuid, id: Uuid) -> Result<Lead, AppError> {
        self.lead_repo
            .find_in_company(company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))
    }

    pub async fn update_lead(&self, actor: &User, id: Uuid, changes: LeadChanges) -> Result<Lead, AppError> {
        let company_id = actor.company_id;
        let current = self.get_lead(company_id, id).await?;

        let unit_id = changes.unit_id.apply_to(current.unit_id);
        let funnel_id = changes.funnel_id.apply_to(current.funnel_id);
        let responsible_id = changes.responsible_id.apply_to(current.responsible_id);

        // Só valida o que mudou
        self.check_references(
            company_id,
            unit_id.filter(|u| Some(*u) != current.unit_id),
            funnel_id.filter(|f| Some(*f) != current.funnel_id),
            responsible_id.filter(|r| Some(*r) != current.responsible_id),
        )
        .await?;

        // Troca de funil reposiciona o lead na primeira etapa
        let step_id = if funnel_id == current.funnel_id {
            current.step_id
        } else {
            match funnel_id {
                Some(f) => self.funnel_repo.first_step(f).await?.map(|s| s.id),
                None => None,
            }
        };

        let mut fields = LeadFields::from(current);
        if let Some(name) = changes.name {
            fields.name = name.trim().to_string();
        }
        if let Some(phone) = changes.phone {
            fields.phone = normalize_phone(&phone);
        }
        if let Some(status) = changes.status_venda {
            fields.status_venda = status;
        }
        if let Some(tags) = changes.tags {
            fields.tags = normalize_tags(tags);
        }
        fields.unit_id = unit_id;
        fields.funnel_id = funnel_id;
        fields.step_id = step_id;
        fields.responsible_id = responsible_id;
        fields.valor_orcamento = changes.valor_orcamento.apply_to(fields.valor_orcamento);
        fields.data_consulta = changes.data_consulta.apply_to(fields.data_consulta);
        fields.duracao_consulta = changes.duracao_consulta.apply_to(fields.duracao_consulta);

        self.lead_repo
            .update_lead(&self.pool, company_id, id, &fields)
            .await
    }

    /// Move o lead para outra etapa do funil em que ele está.
    pub async fn move_to_step(&self, actor: &User, id: Uuid, step_id: Uuid) -> Result<Lead, AppError> {
        let current = self.get_lead(actor.company_id, id).await?;

        let funnel_id = current
            .funnel_id
            .ok_or_else(|| AppError::InvalidReference("funnelId".to_string()))?;

        self.funnel_repo
            .find_step(funnel_id, step_id)
            .await?
            .ok_or_else(|| AppError::InvalidReference("stepId".to_string()))?;

        let mut fields = LeadFields::from(current);
        fields.step_id = Some(step_id);

        self.lead_repo
            .update_lead(&self.pool, actor.company_id, id, &fields)
            .await
    }

    pub async fn delete_lead(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        if !actor.role.can_manage() {
            return Err(AppError::Forbidden);
        }
        self.lead_repo.delete_lead(actor.company_id, id).await?;
        tracing::info!(company_id = %actor.company_id, lead_id = %id, "📇 Lead removido");
        Ok(())
    }

    async fn check_references(
        &self,
        company_id: Uuid,
        unit_id: Option<Uuid>,
        funnel_id: Option<Uuid>,
        responsible_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(unit_id) = unit_id {
            let unit = self.unit_repo.find_in_company(company_id, unit_id).await?;
            if !unit.is_some_and(|u| u.active) {
                return Err(AppError::InvalidReference("unitId".to_string()));
            }
        }
        if let Some(funnel_id) = funnel_id {
            let funnel = self.funnel_repo.find_in_company(company_id, funnel_id).await?;
            if !funnel.is_some_and(|f| f.active) {
                return Err(AppError::InvalidReference("funnelId".to_string()));
            }
        }
        if let Some(responsible_id) = responsible_id {
            if self.user_repo.find_in_company(company_id, responsible_id).await?.is_none() {
                return Err(AppError::InvalidReference("responsibleId".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_keeps_digits_and_plus() {
        assert_eq!(normalize_phone("(11) 99999-8888"), "11999998888");
        assert_eq!(normalize_phone(" +55 11 99999-8888 "), "+5511999998888");
    }

    #[test]
    fn tags_are_cleaned_and_deduplicated() {
        let tags = vec![" Implante ".to_string(), "implante".to_string(), "".to_string(), "VIP".to_string()];
        assert_eq!(normalize_tags(tags), vec!["implante".to_string(), "vip".to_string()]);
    }
}
