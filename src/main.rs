use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

mod config;
mod core;
mod models;
mod services;
mod web;

use crate::config::Settings;
use crate::core::store::{quarantine_snapshot, Store};
use crate::web::server::{start_web_server, AppState};

#[tokio::main]
async fn main() {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(settings.log_level.as_str()));
    info!("Starting {} v{} ({:?})", settings.app_name, settings.version, settings.environment);

    for dir in [settings.upload_dir(), settings.export_dir()] {
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            error!("Cannot create {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    let state = match AppState::new(settings) {
        Ok(state) => actix_web::web::Data::new(state),
        Err(e) => {
            error!("Failed to initialize services: {}", e);
            std::process::exit(1);
        }
    };

    let persistence = state.settings.persistence.clone();
    let state_path = state.settings.state_path();
    if persistence.enabled {
        match state.store.load_from(&state_path).await {
            Ok(true) => info!("Restored state from {}", state_path.display()),
            Ok(false) => info!("No saved state at {}, starting empty", state_path.display()),
            Err(e) => {
                warn!("Cannot restore state from {}: {}", state_path.display(), e);
                if let Err(e) = quarantine_snapshot(&state_path).await {
                    error!("Refusing to start over unreadable state {}: {}", state_path.display(), e);
                    std::process::exit(1);
                }
            }
        }

        let store = Arc::clone(&state.store);
        let path = state_path.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(persistence.interval_secs.max(1)));
            interval.tick().await;
            loop {
                interval.tick().await;
                persist(&store, &path).await;
            }
        });
    }

    let server = match start_web_server(state.clone()) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start web server: {}", e);
            std::process::exit(1);
        }
    };
    let handle = server.handle();
    let server_task = tokio::spawn(server);
    info!("{} is now running. Press Ctrl+C to stop.", state.settings.app_name);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    info!("Shutting down...");

    handle.stop(true).await;
    if let Err(e) = server_task.await {
        error!("Error during web server shutdown: {:?}", e);
    }

    if persistence.enabled {
        persist(&state.store, &state_path).await;
    }
    info!("Shutdown complete");
}

async fn persist(store: &Store, path: &std::path::Path) {
    if let Err(e) = store.persist_to(path).await {
        error!("Failed to persist state to {}: {}", path.display(), e);
    }
}
