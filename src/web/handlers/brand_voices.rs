use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::brand_voice::{BrandVoiceCreate, BrandVoiceUpdate, ValidateContentRequest};
use crate::services::common::PageParams;
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, BrandVoiceListQuery, PaginatedResponse, RedactionResponse, WorkspaceQuery};
use crate::web::server::AppState;

const DEFAULT_WORKSPACE: &str = "default";

pub async fn list_voices(
    data: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<BrandVoiceListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let page = data.brand_voices.list(query.workspace_id.as_deref(), params)?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::from(page)))
}

/// Active voices of a workspace (`default` when not given)
pub async fn active_voices(
    data: web::Data<AppState>,
    _user: CurrentUser,
    query: web::Query<WorkspaceQuery>,
) -> HttpResponse {
    let workspace = query.workspace_id.as_deref().unwrap_or(DEFAULT_WORKSPACE);
    HttpResponse::Ok().json(ApiResponse::ok(data.brand_voices.active(workspace)))
}

pub async fn create_voice(
    data: web::Data<AppState>,
    _user: CurrentUser,
    request: web::Json<BrandVoiceCreate>,
) -> Result<HttpResponse, ServiceError> {
    let voice = data.brand_voices.create(request.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(voice, "Brand voice created")))
}

pub async fn get_voice(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.brand_voices.get(&path)?)))
}

pub async fn update_voice(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<BrandVoiceUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let voice = data.brand_voices.update(&path, request.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(voice)))
}

pub async fn delete_voice(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let voice = data.brand_voices.delete(&path)?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(voice.id, "Brand voice deleted")))
}

/// Check content against the voice's banned terms
pub async fn validate_content(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<ValidateContentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let report = data.brand_voices.validate(&request.content, &path)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(report)))
}

pub async fn redact_content(
    data: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<ValidateContentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (content, replacements) = data.brand_voices.redact(&request.content, &path)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(RedactionResponse { content, replacements })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use crate::web::server::{configure, testing};

    #[actix_web::test]
    async fn test_create_validate_and_redact() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(testing::state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/brand-voices")
            .set_json(json!({
                "workspace_id": "default",
                "name": "House",
                "tone": "warm",
                "style_guide": "Plain words",
                "banned_terms": ["synergy"],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/brand-voices/{}/validate", id))
            .set_json(json!({"content": "Synergy everywhere"}))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["data"]["is_compliant"], false);
        assert_eq!(report["data"]["score"], 90);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/brand-voices/{}/redact", id))
            .set_json(json!({"content": "Synergy everywhere"}))
            .to_request();
        let redacted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(redacted["data"]["content"], "[redacted] everywhere");
        assert_eq!(redacted["data"]["replacements"], 1);

        let req = test::TestRequest::get().uri("/api/v1/brand-voices/active").to_request();
        let active: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(active["data"].as_array().unwrap().len(), 1);
    }
}
