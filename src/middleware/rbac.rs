// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Role,
};

/// 1. O Trait que define quais cargos passam
pub trait RoleRequirement: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião). Usuário ausente vira 401, cargo insuficiente vira 403.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleRequirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let role = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| user.0.role)
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if !T::allows(role) {
            tracing::warn!(role = ?role, "Acesso negado por cargo");
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS REQUISITOS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleRequirement for AdminOnly {
    fn allows(role: Role) -> bool { role.is_admin() }
}

pub struct ManagerOrAbove;
impl RoleRequirement for ManagerOrAbove {
    fn allows(role: Role) -> bool { role.can_manage() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_only_accepts_admins() {
        assert!(AdminOnly::allows(Role::SuperAdmin));
        assert!(AdminOnly::allows(Role::Admin));
        assert!(!AdminOnly::allows(Role::Manager));
        assert!(!AdminOnly::allows(Role::Dentist));
        assert!(!AdminOnly::allows(Role::Worker));
    }

    #[test]
    fn manager_or_above_includes_managers() {
        assert!(ManagerOrAbove::allows(Role::Manager));
        assert!(ManagerOrAbove::allows(Role::Admin));
        assert!(!ManagerOrAbove::allows(Role::Dentist));
    }
}
