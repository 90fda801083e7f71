// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Taxonomia única de erros do domínio. Os serviços nunca devolvem strings soltas.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Data inválida no campo '{0}'")]
    InvalidDate(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Código de unidade já existe: {0}")]
    UnitCodeAlreadyExists(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Acesso negado")]
    Forbidden,

    // --- Regras de negócio (400) ---
    #[error("A unidade SEDE não pode ser removida")]
    ProtectedUnit,

    #[error("Unidade em uso ({funnels} funis, {leads} leads)")]
    UnitInUse { funnels: i64, leads: i64 },

    #[error("Usuário possui vínculos ({leads} leads, {tasks} tarefas pendentes, {consultas} consultas)")]
    UserHasDependencies { leads: i64, tasks: i64, consultas: i64 },

    #[error("O usuário não pode excluir a si mesmo")]
    CannotDeleteSelf,

    #[error("Referência inválida: {0}")]
    InvalidReference(String),

    // --- Infraestrutura (500) ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidDate(_)
            | AppError::ProtectedUnit
            | AppError::UnitInUse { .. }
            | AppError::UserHasDependencies { .. }
            | AppError::CannotDeleteSelf
            | AppError::InvalidReference(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::Forbidden => StatusCode::FORBIDDEN,

            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists
            | AppError::UnitCodeAlreadyExists(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio numa resposta traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let (error, details) = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => store.translate_or(lang, m, m),
                            None => store.translate_or(lang, &e.code, &e.code),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (store.translate(lang, "validation_error", &[]), Some(json!(details)))
            }
            AppError::InvalidDate(field) => (
                store.translate(lang, "invalid_date", &[("field", field.clone())]),
                Some(json!({ "field": field, "code": "invalid_date" })),
            ),
            AppError::EmailAlreadyExists => (store.translate(lang, "email_already_exists", &[]), None),
            AppError::UnitCodeAlreadyExists(code) => (
                store.translate(lang, "unit_code_already_exists", &[("code", code.clone())]),
                None,
            ),
            AppError::UniqueConstraintViolation(what) => (
                store.translate(lang, "unique_violation", &[("what", what.clone())]),
                None,
            ),
            AppError::InvalidCredentials => (store.translate(lang, "invalid_credentials", &[]), None),
            AppError::InvalidToken => (store.translate(lang, "invalid_token", &[]), None),
            AppError::UserNotFound => (store.translate(lang, "user_not_found", &[]), None),
            AppError::ResourceNotFound(what) => (
                store.translate(lang, "resource_not_found", &[("what", what.clone())]),
                None,
            ),
            AppError::Forbidden => (store.translate(lang, "forbidden", &[]), None),
            AppError::ProtectedUnit => (store.translate(lang, "protected_unit", &[]), None),
            AppError::UnitInUse { funnels, leads } => (
                store.translate(lang, "unit_in_use", &[]),
                Some(json!({ "funnelsCount": funnels, "leadsCount": leads })),
            ),
            AppError::UserHasDependencies { leads, tasks, consultas } => (
                store.translate(lang, "user_has_dependencies", &[]),
                Some(json!({ "leadsCount": leads, "tasksCount": tasks, "consultasCount": consultas })),
            ),
            AppError::CannotDeleteSelf => (store.translate(lang, "cannot_delete_self", &[]), None),
            AppError::InvalidReference(what) => (
                store.translate(lang, "invalid_reference", &[("what", what.clone())]),
                None,
            ),
            // O detalhe técnico vai para o log, nunca para o cliente.
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (store.translate(lang, "internal_error", &[]), None)
            }
        };

        ApiError { status, error, details }
    }
}

/// Traduz violações de unicidade do Postgres para erros de domínio.
pub fn map_unique_violation(e: sqlx::Error, on_conflict: impl FnOnce(&str) -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            return on_conflict(&constraint);
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "required"))]
        name: String,
    }

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn business_rules_map_to_bad_request() {
        assert_eq!(AppError::ProtectedUnit.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::UserHasDependencies { leads: 1, tasks: 0, consultas: 0 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidDate("proximaConsulta".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let api = AppError::Forbidden.to_api_error(&pt(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&pt(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["name"][0], "Campo obrigatório.");
    }

    #[test]
    fn dependency_counts_are_exposed() {
        let api = AppError::UserHasDependencies { leads: 3, tasks: 2, consultas: 4 }
            .to_api_error(&Locale("en".to_string()), &I18nStore::new());

        let details = api.details.unwrap();
        assert_eq!(details["leadsCount"], 3);
        assert_eq!(details["tasksCount"], 2);
        assert_eq!(details["consultasCount"], 4);
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco vazou"))
            .to_api_error(&pt(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("senha"));
    }
}
