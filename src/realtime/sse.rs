use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Router,
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::broadcaster::EventBroadcaster;
use super::registry::{ChannelKey, ClientId};
use crate::auth::{AuthUser, Role};
use crate::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StreamQuery {
    /// Brand whose events the caller wants; must match the caller's brand
    pub brand_id: Uuid,
    /// Booth filter; required for staff, who may only watch their own booth
    pub booth_id: Option<Uuid>,
}

/// Unregisters the connection when its stream is dropped, whether the
/// client disconnected or a write failure already pruned it (idempotent).
struct RegistrationGuard {
    broadcaster: Arc<EventBroadcaster>,
    key: ChannelKey,
    client_id: ClientId,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        debug!(key = %self.key, client_id = %self.client_id, "realtime client disconnected");
        self.broadcaster.registry().unregister(&self.key, self.client_id);
    }
}

/// GET /realtime/events — general realtime channel (stock updates, new
/// sales, low-stock alerts), keyed by booth when given, else brand.
#[utoipa::path(
    get,
    path = "/api/v1/realtime/events",
    params(StreamQuery),
    responses(
        (status = 200, description = "SSE stream opened"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller may not watch this brand or booth"),
    ),
    tag = "realtime"
)]
pub async fn realtime_events(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<StreamQuery>,
) -> Response {
    // Authentication and authorization failures must produce bare
    // status responses; no stream is ever opened for them.
    let Some(user) = user else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if let Err(status) = authorize_stream(&user, &query) {
        return status.into_response();
    }

    let client_id = Uuid::new_v4();
    let key = match query.booth_id {
        Some(booth_id) => ChannelKey::Booth(booth_id),
        None => ChannelKey::Brand(query.brand_id),
    };
    let connected = serde_json::json!({
        "type": "connected",
        "timestamp": Utc::now().timestamp_millis(),
    });

    open_stream(&state, state.events.clone(), key, query.brand_id, client_id, connected)
        .into_response()
}

/// GET /realtime/menu-events — menu refresh channel, keyed purely by a
/// per-connection client id; every menu update reaches every client.
#[utoipa::path(
    get,
    path = "/api/v1/realtime/menu-events",
    params(StreamQuery),
    responses(
        (status = 200, description = "SSE stream opened"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller may not watch this brand"),
    ),
    tag = "realtime"
)]
pub async fn menu_events(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let Some(user) = user else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if !user.can_access_brand(query.brand_id) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let client_id = Uuid::new_v4();
    let connected = serde_json::json!({
        "type": "connected",
        "timestamp": Utc::now().timestamp_millis(),
        "clientId": client_id,
    });

    open_stream(
        &state,
        state.menu_events.clone(),
        ChannelKey::Client(client_id),
        query.brand_id,
        client_id,
        connected,
    )
    .into_response()
}

fn authorize_stream(user: &AuthUser, query: &StreamQuery) -> Result<(), StatusCode> {
    if !user.can_access_brand(query.brand_id) {
        return Err(StatusCode::FORBIDDEN);
    }
    if user.role == Role::Staff {
        let booth_id = query.booth_id.ok_or(StatusCode::FORBIDDEN)?;
        if user.booth_id != Some(booth_id) {
            return Err(StatusCode::FORBIDDEN);
        }
    }
    Ok(())
}

/// Registers a client channel and wraps it into an SSE response: the
/// `connected` frame first, then broadcast events as they arrive, with
/// keepalive comment frames on the configured interval.
fn open_stream(
    state: &AppState,
    broadcaster: Arc<EventBroadcaster>,
    key: ChannelKey,
    brand_id: Uuid,
    client_id: ClientId,
    connected: serde_json::Value,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(state.config.realtime.channel_capacity);
    broadcaster
        .registry()
        .register(key.clone(), brand_id, client_id, tx);
    debug!(key = %key, client_id = %client_id, "realtime client connected");

    let guard = RegistrationGuard {
        broadcaster,
        key,
        client_id,
    };

    let first = stream::once(async move {
        Ok::<_, Infallible>(SseEvent::default().data(connected.to_string()))
    });
    let rest = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|payload| {
            (
                Ok::<_, Infallible>(SseEvent::default().data(payload.as_str())),
                (rx, guard),
            )
        })
    });

    Sse::new(first.chain(rest)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.config.realtime.heartbeat_secs))
            .text("keepalive"),
    )
}

pub fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(realtime_events))
        .route("/menu-events", get(menu_events))
}
