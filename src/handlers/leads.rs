// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        dates::{parse_datetime_patch, parse_optional_datetime},
        error::{ApiError, AppError},
        patch::Patch,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::lead::{Lead, LeadFilter, SaleStatus},
    services::lead_service::{LeadChanges, NewLead},
};

// ---
// Validadores
// ---

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("invalid_value".into());
        return Err(err);
    }
    Ok(())
}

fn validate_patch_not_negative(val: &Patch<Decimal>) -> Result<(), ValidationError> {
    match val {
        Patch::Value(v) => validate_not_negative(v),
        _ => Ok(()),
    }
}

pub(crate) fn validate_duration(minutes: i32) -> Result<(), ValidationError> {
    if !(5..=600).contains(&minutes) {
        let mut err = ValidationError::new("range");
        err.message = Some("invalid_duration".into());
        return Err(err);
    }
    Ok(())
}

fn validate_patch_duration(val: &Patch<i32>) -> Result<(), ValidationError> {
    match val {
        Patch::Value(v) => validate_duration(*v),
        _ => Ok(()),
    }
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub name: String,

    #[validate(length(min = 8, message = "invalid_value"))]
    #[schema(example = "(11) 99999-8888")]
    pub phone: String,

    pub unit_id: Option<Uuid>,
    pub funnel_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub status_venda: Option<SaleStatus>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>, example = 1500.0)]
    pub valor_orcamento: Option<Decimal>,

    #[schema(example = "2025-05-10T14:30:00Z")]
    pub data_consulta: Option<String>,

    #[validate(custom(function = "validate_duration"))]
    #[schema(example = 60)]
    pub duracao_consulta: Option<i32>,

    #[serde(default)]
    pub tags: Vec<String>,
}

// PUT com semântica de patch: ausente mantém, null limpa
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 2, message = "required"))]
    pub name: Option<String>,

    #[validate(length(min = 8, message = "invalid_value"))]
    pub phone: Option<String>,

    pub status_venda: Option<SaleStatus>,
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub unit_id: Patch<Uuid>,

    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub funnel_id: Patch<Uuid>,

    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub responsible_id: Patch<Uuid>,

    #[serde(default)]
    #[validate(custom(function = "validate_patch_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub valor_orcamento: Patch<Decimal>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub data_consulta: Patch<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_patch_duration"))]
    #[schema(value_type = Option<i32>)]
    pub duracao_consulta: Patch<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveLeadPayload {
    pub step_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListLeadsQuery {
    pub unit_id: Option<Uuid>,
    pub funnel_id: Option<Uuid>,
    pub status_venda: Option<SaleStatus>,
}

// ---
// Handlers
// ---

#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados ou referências inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let data_consulta = parse_optional_datetime("dataConsulta", payload.data_consulta.as_deref())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let new_lead = NewLead {
        name: payload.name,
        phone: payload.phone,
        unit_id: payload.unit_id,
        funnel_id: payload.funnel_id,
        responsible_id: payload.responsible_id,
        status_venda: payload.status_venda,
        valor_orcamento: payload.valor_orcamento,
        data_consulta,
        duracao_consulta: payload.duracao_consulta,
        tags: payload.tags,
    };

    let lead = app_state.lead_service
        .create_lead(&user, new_lead)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(ListLeadsQuery),
    responses(
        (status = 200, description = "Leads da clínica", body = Vec<Lead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ListLeadsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = LeadFilter {
        unit_id: query.unit_id,
        funnel_id: query.funnel_id,
        status_venda: query.status_venda,
    };

    let leads = app_state.lead_service
        .list_leads(tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(leads))
}

#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state.lead_service
        .get_lead(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 400, description = "Dados ou referências inválidos"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let data_consulta = parse_datetime_patch("dataConsulta", payload.data_consulta)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let changes = LeadChanges {
        name: payload.name,
        phone: payload.phone,
        status_venda: payload.status_venda,
        tags: payload.tags,
        unit_id: payload.unit_id,
        funnel_id: payload.funnel_id,
        responsible_id: payload.responsible_id,
        valor_orcamento: payload.valor_orcamento,
        data_consulta,
        duracao_consulta: payload.duracao_consulta,
    };

    let lead = app_state.lead_service
        .update_lead(&user, id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// PATCH /api/leads/{id}/stage
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/stage",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = MoveLeadPayload,
    responses(
        (status = 200, description = "Lead movido de etapa", body = Lead),
        (status = 400, description = "Etapa não pertence ao funil do lead"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state.lead_service
        .move_to_step(&user, id, payload.step_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Lead removido"),
        (status = 403, description = "Apenas administradores e gerentes"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.lead_service
        .delete_lead(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
