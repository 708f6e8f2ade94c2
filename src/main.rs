use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod client;
mod config;
mod docs;
mod error;
mod lifecycle;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;

use crate::client::upstream::{HttpUpstream, Upstream};
use crate::docs::ApiDoc;
use crate::utils::board_cache::BoardCache;
use tracing::{Level, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "absence-board.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level: Level = config
        .log_level
        .parse()
        .with_context(|| format!("invalid LOG_LEVEL: {}", config.log_level))?;

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(upstream = %config.upstream_api_url, "Server starting...");

    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(config.upstream_api_url.clone()));
    let upstream = Data::from(upstream);
    let boards = Data::new(BoardCache::new(
        config.board_cache_capacity,
        config.board_cache_ttl,
    ));

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets resolve
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(upstream.clone())
            .app_data(boards.clone())
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
