// src/handlers/company.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::company::Company,
};

// GET /api/company
#[utoipa::path(
    get,
    path = "/api/company",
    tag = "Company",
    responses(
        (status = 200, description = "Clínica do usuário autenticado", body = Company)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state.company_repo
        .find_by_id(tenant.0)
        .await
        .and_then(|c| c.ok_or_else(|| AppError::ResourceNotFound("Clínica".to_string())))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}
