use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use log::debug;

use crate::config::{Environment, Settings};
use crate::core::error::{ServiceError, ServiceResult};
use crate::models::User;
use crate::web::server::AppState;

/// Caller resolved from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

/// Map an `Authorization` header value to a user
pub fn resolve_user(settings: &Settings, header: Option<&str>) -> ServiceResult<User> {
    if settings.api_tokens.is_empty() && settings.environment == Environment::Development {
        return Ok(User::development());
    }

    let header = header.ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("Malformed authorization header".to_string()))?;

    settings
        .api_tokens
        .get(token)
        .map(User::from_identity)
        .ok_or_else(|| ServiceError::Unauthorized("Invalid API token".to_string()))
}

impl FromRequest for CurrentUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(ServiceError::ProcessingError(
                "Application state is not configured".to_string(),
            )));
        };
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let result = resolve_user(&state.settings, header).map(CurrentUser);
        if let Ok(user) = &result {
            debug!("Request {} {} by {}", req.method(), req.path(), user.id());
        }
        ready(result)
    }
}
