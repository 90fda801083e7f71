// src/handlers/funnels.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::funnel::{Funnel, FunnelDetail, FunnelStep},
};

fn validate_step_names(steps: &[String]) -> Result<(), ValidationError> {
    if steps.iter().any(|s| s.trim().is_empty()) {
        let mut err = ValidationError::new("length");
        err.message = Some("required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFunnelPayload {
    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Funil de Implantes")]
    pub name: String,

    pub unit_id: Option<Uuid>,

    // Etapas iniciais, na ordem
    #[serde(default)]
    #[validate(custom(function = "validate_step_names"))]
    #[schema(example = json!(["Novo contato", "Avaliação", "Orçamento", "Fechamento"]))]
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStepPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Pós-venda")]
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/funnels",
    tag = "Funnels",
    request_body = CreateFunnelPayload,
    responses(
        (status = 201, description = "Funil criado com as etapas", body = FunnelDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores e gerentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_funnel(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateFunnelPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let funnel = app_state.funnel_service
        .create_funnel(&user, &payload.name, payload.unit_id, &payload.steps)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(funnel)))
}

#[utoipa::path(
    get,
    path = "/api/funnels",
    tag = "Funnels",
    responses(
        (status = 200, description = "Funis ativos da clínica", body = Vec<Funnel>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_funnels(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let funnels = app_state.funnel_service
        .list_funnels(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(funnels))
}

#[utoipa::path(
    get,
    path = "/api/funnels/{id}",
    tag = "Funnels",
    params(("id" = Uuid, Path, description = "ID do funil")),
    responses(
        (status = 200, description = "Funil com etapas ordenadas", body = FunnelDetail),
        (status = 404, description = "Funil não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_funnel(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let funnel = app_state.funnel_service
        .get_funnel(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(funnel))
}

#[utoipa::path(
    post,
    path = "/api/funnels/{id}/steps",
    tag = "Funnels",
    params(("id" = Uuid, Path, description = "ID do funil")),
    request_body = CreateStepPayload,
    responses(
        (status = 201, description = "Etapa adicionada ao final", body = FunnelStep),
        (status = 403, description = "Apenas administradores e gerentes"),
        (status = 404, description = "Funil não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_step(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateStepPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let step = app_state.funnel_service
        .add_step(&user, id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(step)))
}
