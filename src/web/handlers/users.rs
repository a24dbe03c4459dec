use actix_web::HttpResponse;

use crate::web::auth::CurrentUser;
use crate::web::models::ApiResponse;

/// The authenticated caller
pub async fn me(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(user.0))
}
