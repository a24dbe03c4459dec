use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::export::ExportRequest;
use crate::services::common::PageParams;
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, ExportListQuery, PaginatedResponse};
use crate::web::server::AppState;

/// Export a draft; processing happens before the response is sent
pub async fn create_export(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<ExportRequest>,
) -> Result<HttpResponse, ServiceError> {
    let export = data.exports.create(&path, user.id(), request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(export)))
}

pub async fn list_exports(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ExportListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let page = data.exports.list(user.id(), query.draft_id.as_deref(), params)?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::from(page)))
}

pub async fn get_export(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.exports.get(&path, user.id())?)))
}

pub async fn export_status(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.exports.status(&path, user.id())?)))
}

pub async fn retry_export(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let export = data.exports.retry(&path, user.id()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(export)))
}

pub async fn delete_export(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let export = data.exports.delete(&path, user.id()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(export.id, "Export deleted")))
}
