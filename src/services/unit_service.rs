// src/services/unit_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, patch::Patch},
    db::{unit_repo::UnitFields, UnitRepository, UserRepository},
    models::{
        auth::{Role, User},
        unit::{Unit, UnitUsage, HEADQUARTERS_CODE},
    },
};

/// Quais unidades um usuário enxerga, derivado do seu cargo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitScope {
    /// ADMIN / SUPER_ADMIN: todas as unidades da clínica
    All,
    /// MANAGER: as unidades em que é gerente
    ManagedBy(Uuid),
    /// DENTIST / WORKER: apenas a própria unidade
    Own(Uuid),
    /// DENTIST / WORKER sem unidade vinculada
    Nothing,
}

impl UnitScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::SuperAdmin | Role::Admin => UnitScope::All,
            Role::Manager => UnitScope::ManagedBy(user.id),
            Role::Dentist | Role::Worker => match user.unit_id {
                Some(unit_id) => UnitScope::Own(unit_id),
                None => UnitScope::Nothing,
            },
        }
    }

    pub fn allows(&self, unit: &Unit) -> bool {
        match self {
            UnitScope::All => true,
            UnitScope::ManagedBy(manager_id) => unit.manager_id == Some(*manager_id),
            UnitScope::Own(unit_id) => unit.id == *unit_id,
            UnitScope::Nothing => false,
        }
    }
}

/// Ordem das verificações: SEDE (400, qualquer cargo) → cargo (403) → vínculos (400).
pub fn ensure_unit_deletable(unit: &Unit, actor_role: Role, usage: UnitUsage) -> Result<(), AppError> {
    if unit.is_headquarters() {
        return Err(AppError::ProtectedUnit);
    }
    if !actor_role.is_admin() {
        return Err(AppError::Forbidden);
    }
    if !usage.is_empty() {
        return Err(AppError::UnitInUse { funnels: usage.funnels, leads: usage.leads });
    }
    Ok(())
}

/// ADMIN edita qualquer unidade; MANAGER só as que gerencia.
pub fn ensure_unit_editable(unit: &Unit, actor: &User) -> Result<(), AppError> {
    if actor.role.is_admin() || (actor.role == Role::Manager && unit.manager_id == Some(actor.id)) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Dados de entrada já validados pelo handler.
#[derive(Debug, Clone)]
pub struct NewUnit {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UnitChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Patch<String>,
    pub phone: Patch<String>,
    pub email: Patch<String>,
    pub manager_id: Patch<Uuid>,
}

#[derive(Clone)]
pub struct UnitService {
    unit_repo: UnitRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl UnitService {
    pub fn new(unit_repo: UnitRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { unit_repo, user_repo, pool }
    }

    pub async fn get_units(&self, actor: &User, include_inactive: bool) -> Result<Vec<Unit>, AppError> {
        match UnitScope::for_user(actor) {
            UnitScope::All => self.unit_repo.list_by_company(actor.company_id, include_inactive).await,
            UnitScope::ManagedBy(manager_id) => {
                self.unit_repo
                    .list_managed_by(actor.company_id, manager_id, include_inactive)
                    .await
            }
            UnitScope::Own(unit_id) => {
                let unit = self.unit_repo.find_in_company(actor.company_id, unit_id).await?;
                Ok(unit
                    .into_iter()
                    .filter(|u| include_inactive || u.active)
                    .collect())
            }
            UnitScope::Nothing => Ok(Vec::new()),
        }
    }

    /// Unidade fora do escopo do usuário é tratada como inexistente.
    pub async fn get_unit_by_id(&self, actor: &User, id: Uuid) -> Result<Unit, AppError> {
        self.unit_repo
            .find_in_company(actor.company_id, id)
            .await?
            .filter(|unit| UnitScope::for_user(actor).allows(unit))
            .ok_or_else(|| AppError::ResourceNotFound("Unidade".to_string()))
    }

    pub async fn create_unit(&self, actor: &User, new_unit: NewUnit) -> Result<Unit, AppError> {
        if !actor.role.is_admin() {
            return Err(AppError::Forbidden);
        }
        if let Some(manager_id) = new_unit.manager_id {
            self.ensure_user_in_company(actor.company_id, manager_id).await?;
        }

        let fields = UnitFields {
            name: new_unit.name.trim().to_string(),
            code: normalize_code(&new_unit.code),
            address: new_unit.address,
            phone: new_unit.phone,
            email: new_unit.email,
            manager_id: new_unit.manager_id,
        };

        let unit = self.unit_repo
            .create_unit(&self.pool, actor.company_id, &fields)
            .await?;

        tracing::info!(company_id = %actor.company_id, unit_id = %unit.id, code = %unit.code, "🏢 Unidade criada");
        Ok(unit)
    }

    pub async fn update_unit(&self, actor: &User, id: Uuid, changes: UnitChanges) -> Result<Unit, AppError> {
        let current = self.unit_repo
            .find_in_company(actor.company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Unidade".to_string()))?;

        ensure_unit_editable(&current, actor)?;

        // Gerente não pode se retirar nem passar a unidade para outro
        if !actor.role.is_admin() && !changes.manager_id.is_missing() {
            return Err(AppError::Forbidden);
        }

        if let Some(code) = &changes.code {
            if current.is_headquarters() && normalize_code(code) != HEADQUARTERS_CODE {
                return Err(AppError::ProtectedUnit);
            }
        }

        if let Patch::Value(manager_id) = changes.manager_id {
            self.ensure_user_in_company(actor.company_id, manager_id).await?;
        }

        let mut fields = UnitFields::from(current);
        if let Some(name) = changes.name {
            fields.name = name.trim().to_string();
        }
        if let Some(code) = changes.code {
            fields.code = normalize_code(&code);
        }
        fields.address = changes.address.apply_to(fields.address);
        fields.phone = changes.phone.apply_to(fields.phone);
        fields.email = changes.email.apply_to(fields.email);
        fields.manager_id = changes.manager_id.apply_to(fields.manager_id);

        self.unit_repo.update_unit(actor.company_id, id, &fields).await
    }

    /// Exclusão lógica (active = false) com as travas de SEDE, cargo e vínculos.
    pub async fn delete_unit(&self, actor: &User, id: Uuid) -> Result<Unit, AppError> {
        let unit = self.unit_repo
            .find_in_company(actor.company_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Unidade".to_string()))?;

        let usage = if unit.is_headquarters() || !actor.role.is_admin() {
            // SEDE e não-admin falham antes de olhar os vínculos
            UnitUsage::default()
        } else {
            self.unit_repo.count_usage(unit.id).await?
        };

        ensure_unit_deletable(&unit, actor.role, usage)?;

        let unit = self.unit_repo.deactivate(actor.company_id, unit.id).await?;
        tracing::info!(company_id = %actor.company_id, unit_id = %unit.id, "🏢 Unidade desativada");
        Ok(unit)
    }

    async fn ensure_user_in_company(&self, company_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.user_repo
            .find_in_company(company_id, user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::InvalidReference("managerId".to_string()))
    }
}
