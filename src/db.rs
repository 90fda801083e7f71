pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod unit_repo;
pub use unit_repo::UnitRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod funnel_repo;
pub use funnel_repo::FunnelRepository;
pub mod task_repo;
pub use task_repo::TaskRepository;
pub mod consulta_repo;
pub use consulta_repo::ConsultaRepository;
