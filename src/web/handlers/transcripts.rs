use actix_web::{web, HttpResponse};

use crate::core::error::ServiceError;
use crate::models::transcript::{SegmentCreate, TranscriptUpdate};
use crate::web::auth::CurrentUser;
use crate::web::models::ApiResponse;
use crate::web::server::AppState;

/// Transcribe an episode right away, outside of the pipeline
pub async fn transcribe(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    if data.orchestrator.is_active(&path) {
        return Err(ServiceError::Conflict(format!(
            "Episode {} is being processed by a workflow",
            path
        )));
    }
    let view = data.transcripts.transcribe_for(&path, user.id()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(view, "Transcription completed")))
}

pub async fn get_for_episode(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let view = data.transcripts.get_for_episode(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(view)))
}

pub async fn get_transcript(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let view = data.transcripts.get(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(view)))
}

pub async fn update_transcript(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<TranscriptUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let transcript = data.transcripts.update(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(transcript)))
}

pub async fn delete_transcript(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    data.transcripts.delete(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(path.into_inner(), "Transcript deleted")))
}

pub async fn list_segments(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let segments = data.transcripts.segments(&path, user.id())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(segments)))
}

pub async fn add_segment(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<SegmentCreate>,
) -> Result<HttpResponse, ServiceError> {
    let segment = data.transcripts.add_segment(&path, user.id(), request.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(segment)))
}

/// Drop the transcript and transcribe the episode again
pub async fn retry(
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let view = data.transcripts.retry(&path, user.id()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(view, "Transcription restarted")))
}
