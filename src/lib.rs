// src/lib.rs

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Monta o router completo da API sobre o estado já inicializado.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let public_auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh));

    // Perfil e gestão de usuários (protegidas pelo middleware)
    let protected_auth_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/users"
               ,get(handlers::auth::list_users)
               .post(handlers::auth::create_user)
        )
        .route("/users/{id}"
               ,get(handlers::auth::get_user)
               .put(handlers::auth::update_user)
               .delete(handlers::auth::delete_user)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let unit_routes = Router::new()
        .route("/"
               ,get(handlers::units::list_units)
               .post(handlers::units::create_unit)
        )
        .route("/{id}"
               ,get(handlers::units::get_unit)
               .patch(handlers::units::update_unit)
               .delete(handlers::units::delete_unit)
        );

    let funnel_routes = Router::new()
        .route("/"
               ,get(handlers::funnels::list_funnels)
               .post(handlers::funnels::create_funnel)
        )
        .route("/{id}", get(handlers::funnels::get_funnel))
        .route("/{id}/steps", post(handlers::funnels::add_step));

    let lead_routes = Router::new()
        .route("/"
               ,get(handlers::leads::list_leads)
               .post(handlers::leads::create_lead)
        )
        .route("/{id}"
               ,get(handlers::leads::get_lead)
               .put(handlers::leads::update_lead)
               .delete(handlers::leads::delete_lead)
        )
        .route("/{id}/stage", patch(handlers::leads::move_lead));

    let task_routes = Router::new()
        .route("/"
               ,get(handlers::tasks::list_tasks)
               .post(handlers::tasks::create_task)
        )
        .route("/{id}", delete(handlers::tasks::delete_task))
        .route("/{id}/complete", patch(handlers::tasks::complete_task));

    let consulta_routes = Router::new()
        .route("/"
               ,get(handlers::consultas::list_consultas)
               .post(handlers::consultas::create_consulta)
        )
        .route("/{id}"
               ,get(handlers::consultas::get_consulta)
               .put(handlers::consultas::update_consulta)
               .delete(handlers::consultas::delete_consulta)
        )
        .route("/lead/{lead_id}", get(handlers::consultas::list_by_lead));

    // Tudo que fica atrás do token
    let protected_routes = Router::new()
        .route("/company", get(handlers::company::get_company))
        .nest("/units", unit_routes)
        .nest("/funnels", funnel_routes)
        .nest("/leads", lead_routes)
        .nest("/tasks", task_routes)
        .nest("/consultas", consulta_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/auth", public_auth_routes.merge(protected_auth_routes))
        .merge(protected_routes);

    let cors = cors_layer(app_state.config.cors_origin.as_deref());

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origin.map(|o| o.parse::<HeaderValue>()) {
        Some(Ok(origin)) => base.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN inválido; liberando qualquer origem");
            base.allow_origin(Any)
        }
        None => base.allow_origin(Any),
    }
}
