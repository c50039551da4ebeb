pub mod affiliate;
pub mod error;
pub mod feed;
pub mod health;
pub mod job;
pub mod session;
pub mod validation;
pub mod views;
