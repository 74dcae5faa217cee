use serde_json::Value;

use crate::domain::types::PublicId;
use crate::dto::webhooks::WebhookAck;
use crate::forms::webhooks::PaymentNotification;
use crate::models::config::ServerConfig;
use crate::repository::{GatewayPayment, InvoiceWriter};
use crate::services::{ServiceError, ServiceResult, log_failure};

/// Applies a payment gateway notification.
///
/// Failed or unrecognised results are acknowledged without touching the
/// invoice. Repeated deliveries of the same transaction are recorded once.
pub fn handle_payment<R>(
    repo: &R,
    config: &ServerConfig,
    secret: Option<&str>,
    body: &Value,
) -> ServiceResult<WebhookAck>
where
    R: InvoiceWriter + ?Sized,
{
    if let Some(expected) = config.payment_webhook_secret.as_deref() {
        if secret != Some(expected) {
            log::warn!("Rejected payment webhook with a bad secret");
            return Err(ServiceError::AuthenticationFailed("Invalid webhook secret"));
        }
    }

    let notification = PaymentNotification::from_value(body);
    if !notification.success {
        log::info!("Ignoring unsuccessful payment notification");
        return Ok(WebhookAck::ignored());
    }

    let invoice_id = notification
        .invoice_id
        .ok_or_else(|| ServiceError::Validation("Missing invoice id".to_string()))?;
    let public_id: PublicId = invoice_id.parse().map_err(|_| ServiceError::NotFound)?;

    let outcome = repo
        .record_gateway_payment(&GatewayPayment {
            public_id,
            amount: notification.amount,
            transaction_id: notification.transaction_id,
            reference: notification.reference,
        })
        .map_err(log_failure("record gateway payment"))?;

    match &outcome.payment {
        Some(payment) => log::info!(
            "Gateway payment of {} applied to invoice {} ({} users notified)",
            payment.amount,
            outcome.invoice.invoice_number,
            outcome.notified.len()
        ),
        None => log::info!(
            "Duplicate gateway notification for invoice {}",
            outcome.invoice.invoice_number
        ),
    }
    if let Some(job) = outcome.job.as_ref().filter(|job| job.created) {
        log::info!(
            "Invoice {} payment created job {}",
            outcome.invoice.invoice_number,
            job.job.job_number
        );
    }

    Ok(WebhookAck::processed())
}
