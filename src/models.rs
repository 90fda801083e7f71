pub mod auth;
pub mod company;
pub mod unit;
pub mod lead;
pub mod funnel;
pub mod task;
pub mod consulta;
