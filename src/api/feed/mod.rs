pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::feed_config;
pub use service::FeedService;
