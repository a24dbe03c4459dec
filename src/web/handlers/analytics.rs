use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::analytics::{MetricEntryCreate, PerformanceEntryCreate, TrackEventRequest};
use crate::web::auth::CurrentUser;
use crate::web::models::{ApiResponse, LimitQuery, MetricQuery, PeriodQuery, SummaryQuery};
use crate::web::server::AppState;

const DEFAULT_TOP_CONTENT: usize = 10;

pub async fn summary(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<SummaryQuery>,
) -> Result<HttpResponse, ServiceError> {
    let summary = data.analytics.summary(user.id(), query.date_range)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(summary)))
}

pub async fn top_content(
    data: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, ServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_CONTENT);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.analytics.top_content(user.id(), limit)?)))
}

/// Daily buckets of one metric over the requested period
pub async fn metrics_by_period(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> Result<HttpResponse, ServiceError> {
    let buckets = data.analytics.metrics_by_period(user.id(), &path, query.period)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(buckets)))
}

pub async fn track_event(
    data: web::Data<AppState>,
    user: CurrentUser,
    request: web::Json<TrackEventRequest>,
) -> Result<HttpResponse, ServiceError> {
    let event = data.analytics.track_event(Some(user.id()), request.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(event, "Event tracked")))
}

pub async fn record_metric(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<MetricEntryCreate>,
) -> Result<HttpResponse, ServiceError> {
    let entry = data.analytics.record_metric(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(entry)))
}

pub async fn list_metrics(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    query: web::Query<MetricQuery>,
) -> Result<HttpResponse, ServiceError> {
    let entries = data.analytics.list_metrics(&path, user.id(), query.metric.as_deref())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(entries)))
}

pub async fn record_performance(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<PerformanceEntryCreate>,
) -> Result<HttpResponse, ServiceError> {
    let entry = data.analytics.record_performance(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(entry)))
}

pub async fn list_performance(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data.analytics.list_performance(&path, user.id())?)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use crate::web::server::{configure, testing};

    #[actix_web::test]
    async fn test_metrics_are_scoped_to_owned_episodes() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(testing::state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/episodes")
            .set_json(json!({"title": "Metrics episode", "source_type": "upload"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let episode_id = created["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/episodes/{}/metrics", episode_id))
            .set_json(json!({"metric": "views", "value": 42.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/episodes/{}/metrics?metric=views", episode_id))
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/episodes/missing/metrics")
            .set_json(json!({"metric": "views", "value": 1.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/v1/analytics/top-content?limit=0").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get()
            .uri("/api/v1/analytics/summary?date_range=7d")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
