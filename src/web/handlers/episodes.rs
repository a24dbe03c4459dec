use actix_web::{web, HttpRequest, HttpResponse};
use log::info;

use crate::core::error::ServiceError;
use crate::models::episode::{EpisodeCreate, EpisodeUpdate};
use crate::services::episodes::EpisodeFilter;
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, DeletedResponse, EpisodeListQuery, PaginatedResponse, UploadQuery};
use crate::web::server::AppState;

const FILENAME_HEADER: &str = "x-filename";

/// List the caller's episodes
pub async fn list_episodes(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<EpisodeListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let filter = EpisodeFilter {
        status: query.status,
        search: query.search.clone(),
    };
    let page = data.episodes.list(user.id(), query.page(), &filter)?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::from(page)))
}

pub async fn create_episode(
    data: web::Data<AppState>,
    user: CurrentUser,
    request: web::Json<EpisodeCreate>,
) -> Result<HttpResponse, ServiceError> {
    let episode = data.episodes.create(user.id(), request.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(episode, "Episode created")))
}

pub async fn get_episode(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let episode = data.episodes.get(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(episode)))
}

pub async fn update_episode(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<EpisodeUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let episode = data.episodes.update(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(episode)))
}

/// Delete an episode together with everything derived from it
pub async fn delete_episode(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    if data.orchestrator.cancel(&path) {
        info!("Cancelled the running workflow of episode {} before deletion", path);
    }
    let removed = data.episodes.delete(&path, user.id()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        DeletedResponse {
            id: path.into_inner(),
            drafts_removed: removed.drafts.len(),
            exports_removed: removed.exports.len(),
        },
        "Episode deleted",
    )))
}

pub async fn allowed_formats(data: web::Data<AppState>, _user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data.episodes.allowed_formats()))
}

pub async fn upload_url(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let target = data.episodes.upload_target(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(target)))
}

/// Stream the request body into the episode's audio file.
///
/// The file name comes from the `filename` query parameter or the
/// `X-Filename` header; only its extension is used.
pub async fn upload_audio(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    body: web::Payload,
) -> Result<HttpResponse, ServiceError> {
    let filename = query
        .filename
        .clone()
        .or_else(|| {
            req.headers()
                .get(FILENAME_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .ok_or_else(|| {
            ServiceError::ValidationError("A filename query parameter or X-Filename header is required".to_string())
        })?;

    let episode = data.episodes.store_audio(&path, user.id(), &filename, body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(episode, "Audio uploaded")))
}

pub async fn episode_status(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let status = data.episodes.status(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(status)))
}
