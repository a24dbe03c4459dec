use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::seo::{AnalyzeRequest, OptimizationRequest, SeoUpdate};
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, LimitQuery};
use crate::web::server::AppState;

const DEFAULT_KEYWORD_LIMIT: usize = 10;

pub async fn get_seo(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let seo = data.seo.get_for_draft(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(seo)))
}

pub async fn update_seo(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<SeoUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let seo = data.seo.update(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(seo)))
}

/// Compute and store the draft's SEO data
pub async fn optimize(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: Option<web::Json<OptimizationRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let optimization = data.seo.optimize(&path, user.id(), request)?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(optimization, "SEO optimization completed")))
}

pub async fn analyze(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: Option<web::Json<AnalyzeRequest>>,
) -> Result<HttpResponse, ServiceError> {
    let keywords = request.and_then(|r| r.into_inner().keywords);
    let analysis = data.seo.analyze(&path, user.id(), keywords)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(analysis)))
}

pub async fn readability(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.seo.readability(&path, user.id())?)))
}

pub async fn keywords(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_KEYWORD_LIMIT);
    let keywords = data.seo.suggest_keywords(&path, user.id(), limit)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(keywords)))
}

pub async fn meta_tags(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.seo.meta_tags(&path, user.id())?)))
}

pub async fn internal_links(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.seo.internal_links(&path, user.id())?)))
}

/// schema.org JSON-LD of the draft
pub async fn schema(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.seo.schema(&path, user.id())?)))
}
