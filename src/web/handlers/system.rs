use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::core::error::ServiceError;
use crate::web::server::AppState;

/// Service information
pub async fn index(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": data.settings.app_name,
        "version": data.settings.version,
        "environment": data.settings.environment,
        "api": "/api/v1",
        "status": "running",
    }))
}

/// Liveness plus a snapshot of the service state
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let uptime = (Utc::now() - data.started_at).num_seconds().max(0);
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": data.settings.version,
        "environment": data.settings.environment,
        "timestamp": Utc::now(),
        "uptime_seconds": uptime,
        "language_model_configured": data.language_model,
        "active_workflows": data.metrics.active(),
        "websocket_connections": data.events.total_connections(),
        "event_channels": data.events.channel_count(),
        "cache_entries": data.cache.len(),
        "store": data.store.stats(),
    }))
}

/// Prometheus text exposition
pub async fn metrics(data: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    if !data.settings.enable_metrics {
        return Err(ServiceError::NotFound("Metrics are disabled".to_string()));
    }
    let body = data.metrics.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};

    use crate::web::server::{configure, testing};

    #[actix_web::test]
    async fn test_health_reports_state() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(testing::state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["active_workflows"], 0);
        assert_eq!(body["store"]["episodes"], 0);
        assert_eq!(body["language_model_configured"], false);
    }

    #[actix_web::test]
    async fn test_metrics_exposition() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(testing::state(dir.path())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("echopress_workflows_started_total"));
    }
}
