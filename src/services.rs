pub mod auth;
pub mod token_service;
pub mod unit_service;
pub mod funnel_service;
pub mod lead_service;
pub mod task_service;
pub mod consulta_service;
