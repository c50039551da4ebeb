pub mod handlers;
pub mod models;
pub mod service;
pub mod views;

pub use handlers::affiliate_config;
pub use service::AffiliateService;
