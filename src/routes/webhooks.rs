use actix_web::{HttpRequest, HttpResponse, post, web};
use serde_json::Value;

use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, webhooks as service};

pub const SECRET_HEADER: &str = "X-Webhook-Secret";

/// Payment gateway callback; authenticated by the shared secret header.
#[post("/webhooks/payments")]
pub async fn payments(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ServiceError> {
    let secret = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    let ack = service::handle_payment(repo.get_ref(), config.get_ref(), secret, &body)?;
    Ok(HttpResponse::Ok().json(ack))
}
