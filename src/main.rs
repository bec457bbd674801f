use std::{process::ExitCode, sync::Arc};

use log::{error, info};

use crate::{
    config::Config,
    email::{ArcEmailPort, LettreEmailAdapter},
    http::AppState,
    notification::ContactNotifier,
    templates::Branding,
};

mod config;
mod contact;
mod email;
mod http;
mod logs;
mod notification;
mod templates;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine, the variables may come from the environment.
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logs::init_logger(&config.log) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    let email_adapter: ArcEmailPort = match LettreEmailAdapter::new(&config.smtp) {
        Ok(adapter) => Arc::new(adapter),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    email::spawn_relay_check(email_adapter.clone());

    let notifier = Arc::new(ContactNotifier::new(
        email_adapter,
        config.admin_address.clone(),
        Branding::default(),
    ));
    let router = http::build_router(AppState { notifier }, config.allowed_origins.clone());

    info!("Starting contact mailer");

    if let Err(e) = http::run(router, &config.bind_address(), shutdown_signal()).await {
        error!("HTTP server failed: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
