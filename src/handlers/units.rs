// src/handlers/units.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        patch::Patch,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::unit::Unit,
    services::unit_service::{NewUnit, UnitChanges},
};

fn validate_patch_email(email: &Patch<String>) -> Result<(), ValidationError> {
    match email {
        Patch::Value(value) if !value.validate_email() => Err(ValidationError::new("invalid_email")),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListUnitsQuery {
    /// Inclui unidades desativadas
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitPayload {
    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Unidade Centro")]
    pub name: String,

    #[validate(length(min = 2, max = 20, message = "invalid_value"))]
    #[schema(example = "CENTRO")]
    pub code: String,

    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub manager_id: Option<Uuid>,
}

// Atualização parcial; campos opcionais aceitam null para limpar
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitPayload {
    #[validate(length(min = 2, message = "required"))]
    pub name: Option<String>,

    #[validate(length(min = 2, max = 20, message = "invalid_value"))]
    pub code: Option<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub address: Patch<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub phone: Patch<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_patch_email"))]
    #[schema(value_type = Option<String>)]
    pub email: Patch<String>,

    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub manager_id: Patch<Uuid>,
}

// GET /api/units
#[utoipa::path(
    get,
    path = "/api/units",
    tag = "Units",
    params(ListUnitsQuery),
    responses(
        (status = 200, description = "Unidades visíveis para o cargo do usuário", body = Vec<Unit>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_units(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ListUnitsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let units = app_state.unit_service
        .get_units(&user, query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(units))
}

#[utoipa::path(
    get,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade", body = Unit),
        (status = 404, description = "Unidade não encontrada ou fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let unit = app_state.unit_service
        .get_unit_by_id(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(unit))
}

#[utoipa::path(
    post,
    path = "/api/units",
    tag = "Units",
    request_body = CreateUnitPayload,
    responses(
        (status = 201, description = "Unidade criada", body = Unit),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Código já usado na clínica")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateUnitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let new_unit = NewUnit {
        name: payload.name,
        code: payload.code,
        address: payload.address,
        phone: payload.phone,
        email: payload.email,
        manager_id: payload.manager_id,
    };

    let unit = app_state.unit_service
        .create_unit(&user, new_unit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    patch,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    request_body = UpdateUnitPayload,
    responses(
        (status = 200, description = "Unidade atualizada", body = Unit),
        (status = 400, description = "Dados inválidos ou código da SEDE alterado"),
        (status = 403, description = "Sem permissão sobre esta unidade"),
        (status = 404, description = "Unidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUnitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = UnitChanges {
        name: payload.name,
        code: payload.code,
        address: payload.address,
        phone: payload.phone,
        email: payload.email,
        manager_id: payload.manager_id,
    };

    let unit = app_state.unit_service
        .update_unit(&user, id, changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(unit))
}

// DELETE /api/units/{id} (exclusão lógica)
#[utoipa::path(
    delete,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade desativada", body = Unit),
        (status = 400, description = "SEDE ou unidade com funis/leads"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Unidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let unit = app_state.unit_service
        .delete_unit(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_email_clears_without_validation_error() {
        let payload: UpdateUnitPayload = serde_json::from_str(r#"{"email": null}"#).unwrap();
        assert_eq!(payload.email, Patch::Null);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let payload: UpdateUnitPayload = serde_json::from_str(r#"{"email": "not-an-email"}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn absent_manager_is_left_alone() {
        let payload: UpdateUnitPayload = serde_json::from_str(r#"{"name": "Unidade Norte"}"#).unwrap();
        assert!(payload.manager_id.is_missing());
    }
}
