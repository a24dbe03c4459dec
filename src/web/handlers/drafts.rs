use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::draft::{DraftUpdate, RevisionRequest};
use crate::services::common::PageParams;
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, CreateDraftRequest, DeletedResponse, DraftListQuery, PaginatedResponse};
use crate::web::server::AppState;

/// Generate the next draft version of an episode from its transcript
pub async fn create_draft(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: Option<web::Json<CreateDraftRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let draft = data
        .drafts
        .create_for_episode(&path, user.id(), request.brand_voice_id.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(draft, "Draft generated")))
}

pub async fn list_drafts(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<DraftListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let page = data.drafts.list(user.id(), query.episode_id.as_deref(), params)?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::from(page)))
}

pub async fn versions(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let versions = data.drafts.versions(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(versions)))
}

pub async fn get_draft(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let draft = data.drafts.get(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(draft)))
}

pub async fn update_draft(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<DraftUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let draft = data.drafts.update(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(draft)))
}

pub async fn delete_draft(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let removed = data.drafts.delete(&path, user.id()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        DeletedResponse {
            id: path.into_inner(),
            drafts_removed: removed.drafts.len(),
            exports_removed: removed.exports.len(),
        },
        "Draft deleted",
    )))
}

pub async fn regenerate(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let draft = data.drafts.regenerate(&path, user.id()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(draft, "Draft regenerated")))
}

/// Derive a new version with a different tone, length or layout
pub async fn revise(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<RevisionRequest>,
) -> Result<HttpResponse, ServiceError> {
    let draft = data.drafts.revise(&path, user.id(), request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(draft, "Draft revised")))
}
