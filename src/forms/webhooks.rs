//! Payment gateway notifications.
//!
//! The gateway posts loosely typed JSON whose field names depend on the
//! integration in use, so the payload is read from a [`serde_json::Value`]
//! and each field is looked up under all of its known aliases.

use serde_json::Value;

use crate::domain::types::Cents;

const RESULT_KEYS: [&str; 3] = ["Result", "result", "xResult"];
const INVOICE_KEYS: [&str; 3] = ["invoiceId", "xInvoice", "InvoiceID"];
const AMOUNT_KEYS: [&str; 2] = ["amount", "xAmount"];
const TRANSACTION_KEYS: [&str; 3] = ["transactionId", "TransactionID", "xRefNum"];
const REFERENCE_KEYS: [&str; 2] = ["reference", "xOrderID"];

/// Normalised gateway payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub success: bool,
    /// Public id of the invoice as sent by the gateway.
    pub invoice_id: Option<String>,
    /// `None` unless the gateway reported a positive amount.
    pub amount: Option<Cents>,
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
}

impl PaymentNotification {
    pub fn from_value(body: &Value) -> Self {
        let result = first_string(body, &RESULT_KEYS).unwrap_or_default();
        let status = first_string(body, &["status"])
            .unwrap_or_default()
            .to_lowercase();
        let success =
            result.eq_ignore_ascii_case("S") || status == "completed" || status == "paid";

        let amount = first_number(body, &AMOUNT_KEYS)
            .filter(|value| *value > 0.0)
            .map(Cents::from_decimal);

        Self {
            success,
            invoice_id: first_string(body, &INVOICE_KEYS),
            amount,
            transaction_id: first_string(body, &TRANSACTION_KEYS),
            reference: first_string(body, &REFERENCE_KEYS),
        }
    }
}

/// First non-empty value under any of `keys`, numbers rendered as text.
fn first_string(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match body.get(key)? {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn first_number(body: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match body.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gateway_style_payload_is_understood() {
        let payload = PaymentNotification::from_value(&json!({
            "xResult": "S",
            "xInvoice": "7f1f5b8e-7d4e-4a4e-8d8a-0c0e6f5c1a2b",
            "xAmount": "125.50",
            "xRefNum": "998877",
        }));

        assert!(payload.success);
        assert_eq!(
            payload.invoice_id.as_deref(),
            Some("7f1f5b8e-7d4e-4a4e-8d8a-0c0e6f5c1a2b")
        );
        assert_eq!(payload.amount, Some(Cents::new(12_550)));
        assert_eq!(payload.transaction_id.as_deref(), Some("998877"));
    }

    #[test]
    fn status_field_marks_success() {
        let payload = PaymentNotification::from_value(&json!({
            "status": "PAID",
            "invoiceId": "abc",
            "amount": 0,
        }));

        assert!(payload.success);
        assert_eq!(payload.amount, None);
    }

    #[test]
    fn declined_payment_is_not_success() {
        let payload = PaymentNotification::from_value(&json!({"Result": "D"}));
        assert!(!payload.success);
        assert_eq!(payload.invoice_id, None);
    }
}
