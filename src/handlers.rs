pub mod auth;
pub mod health;
pub mod units;
pub mod funnels;
pub mod leads;
pub mod tasks;
pub mod consultas;
pub mod company;
