//! WebSocket streams of workflow events.
//!
//! `/api/v1/ws/episodes/{id}` follows a single episode, `/api/v1/ws/users/{id}`
//! follows every episode of a user. Each session first receives a
//! `connection_established` event, then every event published on its channel
//! as a JSON text frame.

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use chrono::Utc;
use futures::StreamExt;
use log::{debug, info, warn};

use crate::core::error::ServiceError;
use crate::core::events::{ChannelKind, Subscription, WorkflowEvent};
use crate::web::auth::CurrentUser;
use crate::web::server::AppState;

pub async fn episode_stream(
    req: HttpRequest,
    body: web::Payload,
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let episode = data.store.owned_episode(&path, user.id())?;
    let (response, session, stream) = actix_ws::handle(&req, body)?;

    let subscription = data.events.subscribe(ChannelKind::Episode, &episode.id);
    let greeting = WorkflowEvent::ConnectionEstablished {
        episode_id: Some(episode.id.clone()),
        message: format!("Subscribed to episode {}", episode.id),
        timestamp: Utc::now(),
    };
    actix_web::rt::spawn(run_session(session, stream, subscription, greeting));
    Ok(response)
}

pub async fn user_stream(
    req: HttpRequest,
    body: web::Payload,
    data: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    if path.as_str() != user.id() {
        return Err(ServiceError::NotFound(format!("User {}", path)).into());
    }
    let (response, session, stream) = actix_ws::handle(&req, body)?;

    let subscription = data.events.subscribe(ChannelKind::User, user.id());
    let greeting = WorkflowEvent::ConnectionEstablished {
        episode_id: None,
        message: format!("Subscribed to updates of user {}", user.id()),
        timestamp: Utc::now(),
    };
    actix_web::rt::spawn(run_session(session, stream, subscription, greeting));
    Ok(response)
}

/// Pump hub events to the client until either side goes away
async fn run_session(
    mut session: Session,
    mut stream: MessageStream,
    mut subscription: Subscription,
    greeting: WorkflowEvent,
) {
    info!(
        "WebSocket session opened on {:?} channel {}",
        subscription.kind(),
        subscription.id()
    );
    if session.text(greeting.to_json()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        if session.text(event.to_json()).await.is_err() {
                            debug!("Client on {} went away", subscription.id());
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        debug!("Ignoring client message on {}: {}", subscription.id(), text);
                    }
                    Some(Ok(Message::Close(reason))) => {
                        let _ = session.close(reason).await;
                        info!("WebSocket session on {} closed by client", subscription.id());
                        return;
                    }
                    Some(Err(err)) => {
                        warn!("WebSocket protocol error on {}: {}", subscription.id(), err);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
        }
    }

    let _ = session.close(None).await;
    info!("WebSocket session on {} ended", subscription.id());
}
