pub mod handlers;
pub mod logo;
pub mod models;
pub mod service;
pub mod views;

pub use handlers::job_config;
pub use logo::LogoStorage;
pub use service::JobService;
