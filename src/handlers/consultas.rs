// src/handlers/consultas.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        patch::Patch,
    },
    config::AppState,
    handlers::leads::validate_duration,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::consulta::Consulta,
    services::consulta_service::{ConsultaChanges, NewConsulta},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsultaPayload {
    pub lead_id: Uuid,
    pub dentista_id: Uuid,

    // Datas chegam como texto e passam pelo parser único em common::dates
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "2025-04-10T09:00:00-03:00")]
    pub data_consulta: String,

    #[validate(custom(function = "validate_duration"))]
    #[schema(example = 60)]
    pub duracao: i32,

    #[serde(default)]
    pub procedimentos: Vec<String>,
    pub observacoes: Option<String>,

    #[schema(example = "2025-04-24T09:00:00-03:00")]
    pub proxima_consulta: Option<String>,
}

/// `proximaConsulta`: ausente mantém, null limpa, data define (e espelha no lead).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsultaPayload {
    pub dentista_id: Option<Uuid>,

    #[validate(length(min = 1, message = "required"))]
    pub data_consulta: Option<String>,

    #[validate(custom(function = "validate_duration"))]
    pub duracao: Option<i32>,

    pub procedimentos: Option<Vec<String>>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub observacoes: Patch<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub proxima_consulta: Patch<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListConsultasQuery {
    pub lead_id: Option<Uuid>,
    pub dentista_id: Option<Uuid>,
    /// Início do intervalo (inclusive)
    pub from: Option<String>,
    /// Fim do intervalo (exclusivo)
    pub to: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/consultas",
    tag = "Consultas",
    request_body = CreateConsultaPayload,
    responses(
        (status = 201, description = "Consulta registrada (lead sincronizado se houver próxima consulta)", body = Consulta),
        (status = 400, description = "Dados inválidos, data inválida ou dentista de outra clínica"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_consulta(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateConsultaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = NewConsulta {
        lead_id: payload.lead_id,
        dentista_id: payload.dentista_id,
        data_consulta: payload.data_consulta,
        duracao: payload.duracao,
        procedimentos: payload.procedimentos,
        observacoes: payload.observacoes,
        proxima_consulta: payload.proxima_consulta,
    };

    let consulta = app_state.consulta_service
        .create_consulta(tenant.0, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(consulta)))
}

#[utoipa::path(
    put,
    path = "/api/consultas/{id}",
    tag = "Consultas",
    params(("id" = Uuid, Path, description = "ID da consulta")),
    request_body = UpdateConsultaPayload,
    responses(
        (status = 200, description = "Consulta atualizada", body = Consulta),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Consulta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_consulta(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConsultaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = ConsultaChanges {
        dentista_id: payload.dentista_id,
        data_consulta: payload.data_consulta,
        duracao: payload.duracao,
        procedimentos: payload.procedimentos,
        observacoes: payload.observacoes,
        proxima_consulta: payload.proxima_consulta,
    };

    let consulta = app_state.consulta_service
        .update_consulta(tenant.0, id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(consulta))
}

#[utoipa::path(
    get,
    path = "/api/consultas",
    tag = "Consultas",
    params(ListConsultasQuery),
    responses(
        (status = 200, description = "Consultas da clínica", body = Vec<Consulta>),
        (status = 400, description = "Intervalo de datas inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_consultas(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ListConsultasQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let consultas = app_state.consulta_service
        .list_consultas(
            tenant.0,
            query.lead_id,
            query.dentista_id,
            query.from.as_deref(),
            query.to.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(consultas))
}

#[utoipa::path(
    get,
    path = "/api/consultas/{id}",
    tag = "Consultas",
    params(("id" = Uuid, Path, description = "ID da consulta")),
    responses(
        (status = 200, description = "Consulta", body = Consulta),
        (status = 404, description = "Consulta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_consulta(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let consulta = app_state.consulta_service
        .get_consulta(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(consulta))
}

#[utoipa::path(
    get,
    path = "/api/consultas/lead/{lead_id}",
    tag = "Consultas",
    params(("lead_id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Histórico de consultas do lead", body = Vec<Consulta>),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let consultas = app_state.consulta_service
        .list_by_lead(tenant.0, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(consultas))
}

#[utoipa::path(
    delete,
    path = "/api/consultas/{id}",
    tag = "Consultas",
    params(("id" = Uuid, Path, description = "ID da consulta")),
    responses(
        (status = 204, description = "Consulta removida"),
        (status = 404, description = "Consulta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_consulta(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.consulta_service
        .delete_consulta(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_appointment_tri_state_is_preserved() {
        let set: UpdateConsultaPayload =
            serde_json::from_str(r#"{"proximaConsulta": "2025-05-01"}"#).unwrap();
        let cleared: UpdateConsultaPayload = serde_json::from_str(r#"{"proximaConsulta": null}"#).unwrap();
        let untouched: UpdateConsultaPayload = serde_json::from_str(r#"{"duracao": 30}"#).unwrap();

        assert_eq!(set.proxima_consulta, Patch::Value("2025-05-01".to_string()));
        assert_eq!(cleared.proxima_consulta, Patch::Null);
        assert!(untouched.proxima_consulta.is_missing());
    }

    #[test]
    fn update_rejects_out_of_range_duration() {
        let payload: UpdateConsultaPayload = serde_json::from_str(r#"{"duracao": 1000}"#).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn create_rejects_short_duration() {
        let payload: CreateConsultaPayload = serde_json::from_str(
            r#"{
                "leadId": "6f1c4f54-2f65-4f7e-9d9b-8a4f3f1d9e11",
                "dentistaId": "0b3a2c1d-4e5f-4a6b-8c7d-9e0f1a2b3c4d",
                "dataConsulta": "2025-04-10T09:00:00Z",
                "duracao": 2
            }"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
