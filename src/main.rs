use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};

use asistencia::auth::service_account::ServiceAccount;
use asistencia::config::Config;
use asistencia::docs::ApiDoc;
use asistencia::registrar::Registrar;
use asistencia::routes;
use asistencia::store::SheetsStore;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let account = ServiceAccount::from_source(&config.credentials)
        .context("cannot load service account credentials")?;
    info!(client_email = %account.client_email, "Loaded service account");

    let calendar = config
        .calendar()
        .context("UTC_OFFSET_HOURS is out of range")?;
    for day in calendar.days() {
        info!(
            date = %day.date,
            status_column = %day.status_column,
            timestamp_column = %day.timestamp_column,
            "Event day configured"
        );
    }

    let store = SheetsStore::new(account, config.sheet_target(), config.retry_policy())
        .context("cannot build sheets client")?;
    let registrar = Data::new(Registrar::new(Arc::new(store), calendar, config.layout()));
    let limiter = routes::build_limiter(config.rate_register_per_min)?;

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(registrar.clone())
            .configure(|cfg| routes::configure(cfg, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("cannot bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
