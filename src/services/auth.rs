// src/services/auth.rs

use bcrypt::{hash, verify};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, patch::Patch},
    db::{
        unit_repo::UnitFields,
        user_repo::{UserFields, UserUsage},
        CompanyRepository, UnitRepository, UserRepository,
    },
    models::{
        auth::{CreateUserPayload, RegisterUserPayload, Role, TokenType, UpdateUserPayload, User},
        unit::HEADQUARTERS_CODE,
    },
    services::token_service::{TokenPair, TokenService},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    unit_repo: UnitRepository,
    tokens: TokenService,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        unit_repo: UnitRepository,
        tokens: TokenService,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, company_repo, unit_repo, tokens, pool }
    }

    /// Cadastro público: clínica + unidade SEDE + primeiro ADMIN, tudo ou nada.
    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<(User, TokenPair), AppError> {
        // 1. Hashing (fora da transação, pois não toca no banco)
        let password_hash = hash_password(&payload.password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let company = self.company_repo
            .create_company(&mut *tx, payload.company_name.trim())
            .await?;

        let sede = self.unit_repo
            .create_unit(
                &mut *tx,
                company.id,
                &UnitFields {
                    name: "Sede".to_string(),
                    code: HEADQUARTERS_CODE.to_string(),
                    address: None,
                    phone: None,
                    email: None,
                    manager_id: None,
                },
            )
            .await?;

        let admin = self.user_repo
            .create_user(
                &mut *tx,
                company.id,
                &UserFields {
                    unit_id: Some(sede.id),
                    email: normalize_email(&payload.email),
                    password_hash,
                    name: payload.name.trim().to_string(),
                    role: Role::Admin,
                    specialty: None,
                },
            )
            .await?; // Se falhar aqui, a clínica e a SEDE são desfeitas no drop do tx

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(company_id = %company.id, user_id = %admin.id, "🏥 Nova clínica cadastrada");

        let tokens = self.tokens.issue_pair(&admin)?;
        Ok((admin, tokens))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let user = self.user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_pair(&user)?;
        Ok((user, tokens))
    }

    /// Troca um refresh token válido por um par novo. O usuário precisa ainda existir.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AppError> {
        let claims = self.tokens.decode(refresh_token, TokenType::Refresh)?;

        let user = self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let tokens = self.tokens.issue_pair(&user)?;
        Ok((user, tokens))
    }

    /// Usado pelo middleware: só aceita access tokens e recarrega o usuário do banco.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.decode(token, TokenType::Access)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    // =========================================================================
    //  GESTÃO DE USUÁRIOS (escopo: clínica do usuário logado)
    // =========================================================================

    pub async fn list_users(&self, company_id: Uuid) -> Result<Vec<User>, AppError> {
        self.user_repo.list_by_company(company_id).await
    }

    pub async fn get_user(&self, company_id: Uuid, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_in_company(company_id, id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn create_user(&self, actor: &User, payload: &CreateUserPayload) -> Result<User, AppError> {
        let company_id = actor.company_id;
        ensure_can_manage_user(actor, None, Some(payload.role))?;

        if let Some(unit_id) = payload.unit_id {
            self.ensure_unit_in_company(company_id, unit_id).await?;
        }

        let password_hash = hash_password(&payload.password).await?;

        let user = self.user_repo
            .create_user(
                &self.pool,
                company_id,
                &UserFields {
                    unit_id: payload.unit_id,
                    email: normalize_email(&payload.email),
                    password_hash,
                    name: payload.name.trim().to_string(),
                    role: payload.role,
                    specialty: payload.specialty.clone(),
                },
            )
            .await?;

        tracing::info!(company_id = %company_id, user_id = %user.id, role = ?user.role, "👤 Usuário criado");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        actor: &User,
        id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<User, AppError> {
        let company_id = actor.company_id;
        let current = self.get_user(company_id, id).await?;
        ensure_can_manage_user(actor, Some(&current), payload.role)?;

        if let Patch::Value(unit_id) = payload.unit_id {
            self.ensure_unit_in_company(company_id, unit_id).await?;
        }

        let new_hash = match &payload.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut fields = UserFields::from(current);
        if let Some(name) = payload.name {
            fields.name = name.trim().to_string();
        }
        if let Some(email) = payload.email {
            fields.email = normalize_email(&email);
        }
        if let Some(role) = payload.role {
            fields.role = role;
        }
        if let Some(hash) = new_hash {
            fields.password_hash = hash;
        }
        fields.specialty = payload.specialty.apply_to(fields.specialty);
        fields.unit_id = payload.unit_id.apply_to(fields.unit_id);

        self.user_repo.update_user(&self.pool, company_id, id, &fields).await
    }

    /// Contagem e exclusão sob o lock da linha do usuário.
    pub async fn delete_user(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let target = self.user_repo
            .find_for_update(&mut *tx, actor.company_id, id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        ensure_can_manage_user(actor, Some(&target), None)?;

        let usage = self.user_repo.count_usage(&mut *tx, target.id).await?;
        ensure_user_deletable(actor, &target, usage)?;

        self.user_repo.delete_user(&mut *tx, actor.company_id, target.id).await?;
        tx.commit().await?;

        tracing::info!(company_id = %actor.company_id, user_id = %target.id, "🗑️ Usuário removido");
        Ok(())
    }

    async fn ensure_unit_in_company(&self, company_id: Uuid, unit_id: Uuid) -> Result<(), AppError> {
        self.unit_repo
            .find_in_company(company_id, unit_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::InvalidReference("unitId".to_string()))
    }
}

/// Só um SUPER_ADMIN cria, promove, edita ou remove outro SUPER_ADMIN.
pub fn ensure_can_manage_user(actor: &User, target: Option<&User>, new_role: Option<Role>) -> Result<(), AppError> {
    if actor.role == Role::SuperAdmin {
        return Ok(());
    }
    let touches_super_admin = target.is_some_and(|t| t.role == Role::SuperAdmin)
        || new_role == Some(Role::SuperAdmin);
    if touches_super_admin {
        tracing::warn!(actor_id = %actor.id, "Tentativa de gerenciar SUPER_ADMIN negada");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Regras de exclusão: ninguém se exclui; leads, tarefas pendentes e consultas seguram o usuário.
pub fn ensure_user_deletable(actor: &User, target: &User, usage: UserUsage) -> Result<(), AppError> {
    if actor.id == target.id {
        return Err(AppError::CannotDeleteSelf);
    }
    if !usage.is_empty() {
        return Err(AppError::UserHasDependencies {
            leads: usage.leads,
            tasks: usage.tasks,
            consultas: usage.consultas,
        });
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            unit_id: None,
            email: "x@clinica.com".to_string(),
            password_hash: String::new(),
            name: "X".to_string(),
            role,
            specialty: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn user_with_leads_cannot_be_deleted() {
        let usage = UserUsage { leads: 2, ..Default::default() };
        let err = ensure_user_deletable(&user(Role::Admin), &user(Role::Worker), usage).unwrap_err();
        assert!(matches!(err, AppError::UserHasDependencies { leads: 2, tasks: 0, consultas: 0 }));
    }

    #[test]
    fn user_with_pending_tasks_cannot_be_deleted() {
        let usage = UserUsage { tasks: 1, ..Default::default() };
        let err = ensure_user_deletable(&user(Role::Admin), &user(Role::Worker), usage).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn dentist_with_consultas_cannot_be_deleted() {
        let usage = UserUsage { consultas: 3, ..Default::default() };
        let err = ensure_user_deletable(&user(Role::Admin), &user(Role::Dentist), usage).unwrap_err();
        assert!(matches!(err, AppError::UserHasDependencies { consultas: 3, .. }));
    }

    #[test]
    fn admin_cannot_grant_or_touch_super_admin() {
        let admin = user(Role::Admin);
        let root = user(Role::SuperAdmin);

        assert!(matches!(
            ensure_can_manage_user(&admin, None, Some(Role::SuperAdmin)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            ensure_can_manage_user(&admin, Some(&user(Role::Worker)), Some(Role::SuperAdmin)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(ensure_can_manage_user(&admin, Some(&root), None), Err(AppError::Forbidden)));
        assert!(matches!(
            ensure_can_manage_user(&admin, Some(&root), Some(Role::Worker)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn admin_manages_regular_roles_and_super_admin_manages_all() {
        let admin = user(Role::Admin);
        assert!(ensure_can_manage_user(&admin, None, Some(Role::Admin)).is_ok());
        assert!(ensure_can_manage_user(&admin, Some(&user(Role::Dentist)), Some(Role::Manager)).is_ok());

        let root = user(Role::SuperAdmin);
        assert!(ensure_can_manage_user(&root, Some(&user(Role::SuperAdmin)), None).is_ok());
        assert!(ensure_can_manage_user(&root, None, Some(Role::SuperAdmin)).is_ok());
    }

    #[test]
    fn admin_cannot_delete_itself() {
        let admin = user(Role::Admin);
        let err = ensure_user_deletable(&admin, &admin, UserUsage::default()).unwrap_err();
        assert!(matches!(err, AppError::CannotDeleteSelf));
    }

    #[test]
    fn free_user_can_be_deleted() {
        assert!(ensure_user_deletable(&user(Role::Admin), &user(Role::Dentist), UserUsage::default()).is_ok());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Clinica.COM "), "ana@clinica.com");
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
