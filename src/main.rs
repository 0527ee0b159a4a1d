mod aiforged;
mod api;
mod config;
mod models;
mod utils;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;

use crate::aiforged::Context;
use crate::api::ControllerOptions;
use crate::config::Settings;

fn startup_error(message: String) -> io::Error {
    log::error!("❌ {}", message);
    io::Error::new(io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| startup_error(e.to_string()))?;

    log::info!("🚀 Starting AIForged integration service...");

    let config = aiforged::Config::new(
        &settings.aiforged.base_url,
        &settings.aiforged.api_key,
        settings.aiforged.timeout,
    )
    .map_err(|e| startup_error(e.to_string()))?;
    log::info!("🔗 Platform: {}", config.base_url());

    // The service does not start unless the API key is accepted.
    let (context, user) = Context::new(Arc::new(config))
        .authenticate()
        .await
        .map_err(|e| startup_error(format!("Authentication with AIForged failed: {}", e)))?;

    log::info!(
        "✅ Successfully authenticated as: {}",
        user.email.as_deref().unwrap_or(&user.id)
    );

    let context = web::Data::new(context);
    let options = ControllerOptions {
        strict_delete: settings.aiforged.strict_delete,
    };
    if options.strict_delete {
        log::info!("🗑️  Strict delete reporting enabled");
    }

    log::info!("🌐 Server starting on {}:{}", settings.host, settings.port);

    HttpServer::new(move || {
        App::new()
            .app_data(context.clone())
            .wrap(Logger::default())
            .configure(api::configure(options))
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
