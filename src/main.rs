use std::fmt::Display;
use std::io;
use std::sync::Arc;

use actix_files::Files;
use actix_multipart::form::MultipartFormConfig;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, web};
use chrono::Utc;
use clap::Parser;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use tracing_subscriber::{Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod config;
mod db;
mod shutdown;
mod token;

use crate::api::{
    affiliate::{AffiliateService, affiliate_config},
    feed::{FeedService, feed_config},
    health::health_config,
    job::{JobService, LogoStorage, job_config},
    validation,
};
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::db::{EntityStore, PgStore};
use crate::shutdown::ShutdownCoordinator;

fn failure(what: &str, e: impl Display) -> io::Error {
    io::Error::other(format!("Failed to {what}: {e}"))
}

/// Console output plus daily rolling files split per level,
/// e.g. logs/info.log.2024-12-22, logs/error.log.2024-12-22
fn init_tracing(log_dir: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(log_dir, "info.log");
    let warn_file = tracing_appender::rolling::daily(log_dir, "warn.log");
    let error_file = tracing_appender::rolling::daily(log_dir, "error.log");
    let debug_file = tracing_appender::rolling::daily(log_dir, "debug.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .with(debug_layer)
        .init();
}

fn session_key(config: &Config) -> Key {
    match &config.session_secret {
        // Length is checked when the configuration is loaded
        Some(secret) => Key::from(secret.as_bytes()),
        None => {
            warn!("SESSION_SECRET not set, sessions will not survive a restart");
            Key::generate()
        }
    }
}

async fn serve(config: Config, pool: Pool<Postgres>) -> io::Result<()> {
    db::migrations::run_migrations(&pool)
        .await
        .map_err(|e| failure("run database migrations", e))?;

    std::fs::create_dir_all(&config.upload_dir)?;

    let store: Arc<dyn EntityStore> = Arc::new(PgStore::new(pool.clone()));
    let logos = LogoStorage::new(&config.upload_dir, config.logo_max_size);

    let job_service = web::Data::new(JobService::new(store.clone(), config.jobs, logos));
    let affiliate_service = web::Data::new(AffiliateService::new(store.clone()));
    let feed_service = web::Data::new(FeedService::new(store.clone()));
    let store_data: web::Data<dyn EntityStore> = web::Data::from(store);

    let key = session_key(&config);
    let cookie_secure = config.session_cookie_secure;
    let max_payload_size = config.max_payload_size;
    let upload_dir = config.upload_dir.clone();

    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Jobs online for {} days, extendable within {} days", config.jobs.active_days, config.jobs.extend_window_days);
    info!("  - Logos stored in {} (max {} bytes)", upload_dir, config.logo_max_size);

    let server = HttpServer::new(move || {
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);
        let form_config = web::FormConfig::default().limit(max_payload_size);
        let multipart_config = MultipartFormConfig::default().total_limit(max_payload_size);

        let sessions = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_secure(cookie_secure)
            .build();

        App::new()
            .wrap(sessions)
            .app_data(store_data.clone())
            .app_data(job_service.clone())
            .app_data(affiliate_service.clone())
            .app_data(feed_service.clone())
            .app_data(payload_config)
            .app_data(form_config)
            .app_data(multipart_config)
            .app_data(validation::query_config())
            .configure(health_config)
            .configure(job_config)
            .configure(affiliate_config)
            .configure(feed_config)
            .service(Files::new(api::job::logo::LOGO_URL_PREFIX, upload_dir.clone()))
    });

    info!("Server starting on http://{}:{}", config.bind_address, config.port);

    let server = server.bind((config.bind_address.as_str(), config.port))?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, pool)
        .wait_for_shutdown()
        .await
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().map_err(|e| failure("load configuration", e))?;

    std::fs::create_dir_all(&config.log_dir)?;
    init_tracing(&config.log_dir);

    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| failure("connect to database", e))?;
    info!("Database connection pool established");

    match cli.command() {
        Command::Serve => serve(config, pool).await,
        Command::Migrate => {
            db::migrations::run_migrations(&pool)
                .await
                .map_err(|e| failure("run database migrations", e))?;
            pool.close().await;
            Ok(())
        }
        Command::Cleanup { days } => {
            let store = Arc::new(PgStore::new(pool.clone()));
            let logos = LogoStorage::new(&config.upload_dir, config.logo_max_size);
            let removed = JobService::new(store, config.jobs, logos)
                .cleanup(days, Utc::now())
                .await
                .map_err(|e| failure("clean up stale jobs", e))?;
            info!("Removed {} stale jobs", removed);
            pool.close().await;
            Ok(())
        }
        Command::ActivateAffiliate { id } => {
            let affiliate = AffiliateService::new(Arc::new(PgStore::new(pool.clone())))
                .activate(id)
                .await
                .map_err(|e| failure("activate affiliate", e))?;
            info!("Affiliate {} ({}) activated, token {}", affiliate.id, affiliate.email, affiliate.token);
            pool.close().await;
            Ok(())
        }
    }
}
