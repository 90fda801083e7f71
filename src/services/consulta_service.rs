// src/services/consulta_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        dates::{parse_datetime, parse_datetime_patch, parse_optional_datetime},
        error::AppError,
        patch::Patch,
    },
    db::{ConsultaRepository, LeadRepository, UserRepository},
    models::consulta::{Consulta, ConsultaFields, ConsultaFilter},
};

/// O que fazer com o espelho da próxima consulta no Lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadSync {
    Untouched,
    Set { data_consulta: DateTime<Utc>, duracao: i32 },
    Clear,
}

/// Na criação: só escreve no lead quando há próxima consulta.
pub fn lead_sync_on_create(proxima_consulta: Option<DateTime<Utc>>, duracao: i32) -> LeadSync {
    match proxima_consulta {
        Some(data_consulta) => LeadSync::Set { data_consulta, duracao },
        None => LeadSync::Untouched,
    }
}

/// Na atualização:
/// ausente → nada muda; data → sobrescreve o lead;
/// null → limpa o lead apenas se ele ainda espelha a data antiga desta consulta.
pub fn lead_sync_on_update(
    proxima_consulta: &Patch<DateTime<Utc>>,
    previous: Option<DateTime<Utc>>,
    lead_data_consulta: Option<DateTime<Utc>>,
    duracao: i32,
) -> LeadSync {
    match proxima_consulta {
        Patch::Missing => LeadSync::Untouched,
        Patch::Value(data_consulta) => LeadSync::Set { data_consulta: *data_consulta, duracao },
        Patch::Null => mirror_cleared(previous, lead_data_consulta),
    }
}

fn mirror_cleared(previous: Option<DateTime<Utc>>, lead_data_consulta: Option<DateTime<Utc>>) -> LeadSync {
    if previous.is_some() && previous == lead_data_consulta {
        LeadSync::Clear
    } else {
        LeadSync::Untouched
    }
}

/// Entrada de criação: datas ainda em texto, convertidas aqui.
#[derive(Debug, Clone)]
pub struct NewConsulta {
    pub lead_id: Uuid,
    pub dentista_id: Uuid,
    pub data_consulta: String,
    pub duracao: i32,
    pub procedimentos: Vec<String>,
    pub observacoes: Option<String>,
    pub proxima_consulta: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsultaChanges {
    pub dentista_id: Option<Uuid>,
    pub data_consulta: Option<String>,
    pub duracao: Option<i32>,
    pub procedimentos: Option<Vec<String>>,
    pub observacoes: Patch<String>,
    pub proxima_consulta: Patch<String>,
}

#[derive(Clone)]
pub struct ConsultaService {
    consulta_repo: ConsultaRepository,
    lead_repo: LeadRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl ConsultaService {
    pub fn new(
        consulta_repo: ConsultaRepository,
        lead_repo: LeadRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { consulta_repo, lead_repo, user_repo, pool }
    }

    /// Insere a consulta e, se houver próxima consulta, espelha no lead. Tudo numa transação.
    pub async fn create_consulta(&self, company_id: Uuid, input: NewConsulta) -> Result<Consulta, AppError> {
        let data_consulta = parse_datetime("dataConsulta", &input.data_consulta)?;
        let proxima_consulta = parse_optional_datetime("proximaConsulta", input.proxima_consulta.as_deref())?;

        // Lead inexistente é 404 mesmo quando o dentista também é inválido
        self.lead_repo
            .find_in_company(company_id, input.lead_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))?;
        self.ensure_dentist(company_id, input.dentista_id).await?;

        let fields = ConsultaFields {
            dentista_id: input.dentista_id,
            data_consulta,
            duracao: input.duracao,
            procedimentos: clean_procedures(input.procedimentos),
            observacoes: input.observacoes,
            proxima_consulta,
        };

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let lead = self.lead_repo
            .find_for_update(&mut *tx, company_id, input.lead_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))?;

        let consulta = self.consulta_repo
            .create_consulta(&mut *tx, company_id, lead.id, &fields)
            .await?;

        self.apply_lead_sync(&mut tx, lead.id, lead_sync_on_create(proxima_consulta, fields.duracao))
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(consulta)
    }

    pub async fn update_consulta(
        &self,
        company_id: Uuid,
        id: Uuid,
        changes: ConsultaChanges,
    ) -> Result<Consulta, AppError> {
        // Parsing antes de abrir a transação
        let data_consulta = changes
            .data_consulta
            .as_deref()
            .map(|raw| parse_datetime("dataConsulta", raw))
            .transpose()?;
        let proxima_consulta = parse_datetime_patch("proximaConsulta", changes.proxima_consulta)?;

        if let Some(dentista_id) = changes.dentista_id {
            self.ensure_dentist(company_id, dentista_id).await?;
        }

        let mut tx = self.pool.begin().await?;

        let current = self.consulta_repo
            .find_for_update(&mut *tx, company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Consulta".to_string()))?;

        let lead = self.lead_repo
            .find_for_update(&mut *tx, company_id, current.lead_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))?;

        let previous_proxima = current.proxima_consulta;

        let mut fields = ConsultaFields::from(current);
        if let Some(dentista_id) = changes.dentista_id {
            fields.dentista_id = dentista_id;
        }
        if let Some(data) = data_consulta {
            fields.data_consulta = data;
        }
        if let Some(duracao) = changes.duracao {
            fields.duracao = duracao;
        }
        if let Some(procedimentos) = changes.procedimentos {
            fields.procedimentos = clean_procedures(procedimentos);
        }
        fields.observacoes = changes.observacoes.apply_to(fields.observacoes);

        let sync = lead_sync_on_update(&proxima_consulta, previous_proxima, lead.data_consulta, fields.duracao);
        fields.proxima_consulta = proxima_consulta.apply_to(fields.proxima_consulta);

        let updated = self.consulta_repo
            .update_consulta(&mut *tx, company_id, id, &fields)
            .await?;

        self.apply_lead_sync(&mut tx, lead.id, sync).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a consulta; o lead perde a data só se ainda espelhava esta consulta.
    pub async fn delete_consulta(&self, company_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.consulta_repo
            .find_for_update(&mut *tx, company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Consulta".to_string()))?;

        let lead = self.lead_repo
            .find_for_update(&mut *tx, company_id, current.lead_id)
            .await?;

        self.consulta_repo
            .delete_consulta(&mut *tx, company_id, current.id)
            .await?;

        if let Some(lead) = lead {
            let sync = mirror_cleared(current.proxima_consulta, lead.data_consulta);
            self.apply_lead_sync(&mut tx, lead.id, sync).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_consulta(&self, company_id: Uuid, id: Uuid) -> Result<Consulta, AppError> {
        self.consulta_repo
            .find_in_company(company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Consulta".to_string()))
    }

    pub async fn list_consultas(
        &self,
        company_id: Uuid,
        lead_id: Option<Uuid>,
        dentista_id: Option<Uuid>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Consulta>, AppError> {
        let filter = ConsultaFilter {
            lead_id,
            dentista_id,
            from: parse_optional_datetime("from", from)?,
            to: parse_optional_datetime("to", to)?,
        };
        self.consulta_repo.list(company_id, &filter).await
    }

    pub async fn list_by_lead(&self, company_id: Uuid, lead_id: Uuid) -> Result<Vec<Consulta>, AppError> {
        self.lead_repo
            .find_in_company(company_id, lead_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lead".to_string()))?;

        let filter = ConsultaFilter { lead_id: Some(lead_id), ..Default::default() };
        self.consulta_repo.list(company_id, &filter).await
    }

    async fn apply_lead_sync(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        lead_id: Uuid,
        sync: LeadSync,
    ) -> Result<(), AppError> {
        match sync {
            LeadSync::Untouched => {}
            LeadSync::Set { data_consulta, duracao } => {
                self.lead_repo
                    .set_appointment(&mut **tx, lead_id, Some(data_consulta), Some(duracao))
                    .await?;
                tracing::info!(lead_id = %lead_id, data_consulta = %data_consulta, "📅 Próxima consulta espelhada no lead");
            }
            LeadSync::Clear => {
                self.lead_repo.set_appointment(&mut **tx, lead_id, None, None).await?;
                tracing::info!(lead_id = %lead_id, "📅 Próxima consulta removida do lead");
            }
        }
        Ok(())
    }

    async fn ensure_dentist(&self, company_id: Uuid, dentista_id: Uuid) -> Result<(), AppError> {
        self.user_repo
            .find_in_company(company_id, dentista_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::InvalidReference("dentistaId".to_string()))
    }
}

fn clean_procedures(procedimentos: Vec<String>) -> Vec<String> {
    procedimentos
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn create_with_next_appointment_sets_lead() {
        assert_eq!(
            lead_sync_on_create(Some(at(20)), 45),
            LeadSync::Set { data_consulta: at(20), duracao: 45 }
        );
    }

    #[test]
    fn create_without_next_appointment_leaves_lead() {
        assert_eq!(lead_sync_on_create(None, 45), LeadSync::Untouched);
    }

    #[test]
    fn missing_field_on_update_leaves_lead() {
        assert_eq!(lead_sync_on_update(&Patch::Missing, Some(at(20)), Some(at(20)), 30), LeadSync::Untouched);
    }

    #[test]
    fn new_date_on_update_overwrites_lead() {
        assert_eq!(
            lead_sync_on_update(&Patch::Value(at(25)), Some(at(20)), Some(at(20)), 30),
            LeadSync::Set { data_consulta: at(25), duracao: 30 }
        );
    }

    #[test]
    fn null_clears_lead_only_when_it_mirrors_this_consulta() {
        assert_eq!(lead_sync_on_update(&Patch::Null, Some(at(20)), Some(at(20)), 30), LeadSync::Clear);
        // Outro fluxo já remarcou o lead: não apaga
        assert_eq!(lead_sync_on_update(&Patch::Null, Some(at(20)), Some(at(22)), 30), LeadSync::Untouched);
        // A consulta não tinha próxima data
        assert_eq!(lead_sync_on_update(&Patch::Null, None, None, 30), LeadSync::Untouched);
    }

    #[test]
    fn procedures_are_trimmed() {
        let cleaned = clean_procedures(vec![" limpeza ".to_string(), "  ".to_string(), "canal".to_string()]);
        assert_eq!(cleaned, vec!["limpeza".to_string(), "canal".to_string()]);
    }
}
