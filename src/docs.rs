// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::get_me,

        // --- Users ---
        handlers::auth::list_users,
        handlers::auth::create_user,
        handlers::auth::get_user,
        handlers::auth::update_user,
        handlers::auth::delete_user,

        // --- Company ---
        handlers::company::get_company,

        // --- Units ---
        handlers::units::list_units,
        handlers::units::get_unit,
        handlers::units::create_unit,
        handlers::units::update_unit,
        handlers::units::delete_unit,

        // --- Funnels ---
        handlers::funnels::create_funnel,
        handlers::funnels::list_funnels,
        handlers::funnels::get_funnel,
        handlers::funnels::add_step,

        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::move_lead,
        handlers::leads::delete_lead,

        // --- Tasks ---
        handlers::tasks::create_task,
        handlers::tasks::list_tasks,
        handlers::tasks::complete_task,
        handlers::tasks::delete_task,

        // --- Consultas ---
        handlers::consultas::create_consulta,
        handlers::consultas::update_consulta,
        handlers::consultas::list_consultas,
        handlers::consultas::get_consulta,
        handlers::consultas::list_by_lead,
        handlers::consultas::delete_consulta,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::RefreshTokenPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,

            models::company::Company,
            models::unit::Unit,

            // --- CRM ---
            models::funnel::Funnel,
            models::funnel::FunnelStep,
            models::funnel::FunnelDetail,
            models::lead::SaleStatus,
            models::lead::Lead,
            models::task::Task,
            models::consulta::Consulta,

            // --- Payloads ---
            handlers::units::CreateUnitPayload,
            handlers::units::UpdateUnitPayload,
            handlers::funnels::CreateFunnelPayload,
            handlers::funnels::CreateStepPayload,
            handlers::leads::CreateLeadPayload,
            handlers::leads::UpdateLeadPayload,
            handlers::leads::MoveLeadPayload,
            handlers::tasks::CreateTaskPayload,
            handlers::consultas::CreateConsultaPayload,
            handlers::consultas::UpdateConsultaPayload,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Autenticação, registro e tokens"),
        (name = "Users", description = "Gestão de usuários da clínica"),
        (name = "Company", description = "Dados da clínica"),
        (name = "Units", description = "Unidades da clínica (SEDE e filiais)"),
        (name = "Funnels", description = "Funis de venda e etapas"),
        (name = "Leads", description = "Pacientes no funil de vendas"),
        (name = "Tasks", description = "Tarefas de follow-up"),
        (name = "Consultas", description = "Consultas e sincronização da próxima data no lead")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_consulta_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/consultas"));
        assert!(doc.paths.paths.contains_key("/api/units/{id}"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
