// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::patch::Patch;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Worker,
    Dentist,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// Administradores e gerentes podem mexer em funis e excluir leads.
    pub fn can_manage(self) -> bool {
        self.is_admin() || self == Role::Manager
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub company_id: Uuid,
    pub unit_id: Option<Uuid>,

    #[schema(example = "dra.ana@clinica.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Dra. Ana Souza")]
    pub name: String,
    pub role: Role,

    #[schema(example = "Ortodontia")]
    pub specialty: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cadastro público: cria a clínica (company) e o primeiro administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Clínica Sorriso")]
    pub company_name: String,

    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Carlos Lima")]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "carlos@sorriso.com")]
    pub email: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "carlos@sorriso.com")]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenPayload {
    #[validate(length(min = 1, message = "required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "Dr. Paulo Mendes")]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    pub email: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,

    #[schema(example = "DENTIST")]
    pub role: Role,

    pub specialty: Option<String>,
    pub unit_id: Option<Uuid>,
}

// Atualização parcial. `specialty` e `unitId` aceitam null para limpar.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 2, message = "required"))]
    pub name: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: Option<String>,

    pub role: Option<Role>,

    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub specialty: Patch<String>,

    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub unit_id: Patch<Uuid>,
}

// Resposta de autenticação com os tokens
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // Subject (ID do usuário)
    pub company_id: Uuid, // Tenant
    pub role: Role,
    pub token_type: TokenType,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
