use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::workflow::WorkflowRun;
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, CancelResponse};
use crate::web::server::AppState;

/// Runs of the caller that are still in flight
pub async fn active_runs(data: web::Data<AppState>, user: CurrentUser) -> HttpResponse {
    let runs: Vec<WorkflowRun> = data
        .orchestrator
        .list_active()
        .into_iter()
        .filter(|run| run.user_id == user.id())
        .collect();
    HttpResponse::Ok().json(ApiResponse::ok(runs))
}

/// Queue the full processing pipeline for an episode
pub async fn start(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let episode = data.store.owned_episode(&path, user.id())?;
    let run = data.orchestrator.start(&episode.id)?;
    Ok(HttpResponse::Accepted().json(ApiResponse::with_message(run, "Workflow started")))
}

pub async fn status(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let episode = data.store.owned_episode(&path, user.id())?;
    let run = data
        .orchestrator
        .status(&episode.id)
        .ok_or_else(|| ServiceError::NotFound(format!("Workflow for episode {}", episode.id)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(run)))
}

pub async fn cancel(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let episode = data.store.owned_episode(&path, user.id())?;
    let cancelled = data.orchestrator.cancel(&episode.id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(CancelResponse {
        episode_id: episode.id,
        cancelled,
    })))
}
