use std::convert::Infallible;
use std::time::Duration;

use actix_web::rt::time::{Instant, Interval, interval_at};
use actix_web::web::Bytes;
use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use futures_util::stream;
use serde::Serialize;
use serde_json::json;

use crate::dto::notifications::NotificationBatch;
use crate::forms::notifications::{NotificationListParams, StreamParams};
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, notifications as service};

#[get("/notifications")]
pub async fn list_notifications(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    params: web::Query<NotificationListParams>,
) -> Result<HttpResponse, ServiceError> {
    let feed = service::list_notifications(repo.get_ref(), &user, params.into_inner())?;
    Ok(HttpResponse::Ok().json(feed))
}

#[post("/notifications/{id}/read")]
pub async fn mark_read(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let notification = service::mark_read(repo.get_ref(), &user, id.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({ "notification": notification })))
}

#[post("/notifications/read-all")]
pub async fn read_all(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let updated = service::mark_all_read(repo.get_ref(), &user)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "updated": updated })))
}

/// One server-sent event frame.
fn frame<T: Serialize>(event: &str, data: &T) -> Bytes {
    let data = serde_json::to_string(data).unwrap_or_else(|err| {
        log::error!("Failed to encode {event} event: {err}");
        "{}".to_string()
    });
    Bytes::from(format!("event: {event}\ndata: {data}\n\n"))
}

struct StreamState {
    repo: web::Data<DieselRepository>,
    user: AuthenticatedUser,
    cursor: i32,
    period: Duration,
    ticker: Option<Interval>,
}

impl StreamState {
    async fn next_frame(&mut self) -> Bytes {
        let Some(ticker) = self.ticker.as_mut() else {
            self.ticker = Some(interval_at(Instant::now() + self.period, self.period));
            return frame("hello", &json!({ "ok": true, "cursor": self.cursor }));
        };
        ticker.tick().await;

        match service::poll_stream(self.repo.get_ref(), &self.user, self.cursor) {
            Ok((notifications, _)) if notifications.is_empty() => {
                frame("ping", &json!({ "t": Utc::now().to_rfc3339() }))
            }
            Ok((notifications, cursor)) => {
                self.cursor = cursor;
                frame("notifications", &NotificationBatch { notifications })
            }
            Err(_) => frame("error", &json!({ "error": "stream_error" })),
        }
    }
}

/// Pushes the caller's new notifications every poll interval.
///
/// `since` is the id of the newest notification the client already has;
/// without it the stream replays from the beginning in batches.
#[get("/notifications/stream")]
pub async fn notification_stream(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
    params: web::Query<StreamParams>,
) -> HttpResponse {
    let state = StreamState {
        repo,
        user,
        cursor: params.since.unwrap_or(0).max(0),
        period: Duration::from_secs(config.notification_poll_secs.max(1)),
        ticker: None,
    };

    let events = stream::unfold(state, |mut state| async move {
        let frame = state.next_frame().await;
        Some((Ok::<_, Infallible>(frame), state))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache, no-transform"))
        .streaming(events)
}
