use serde::Serialize;

/// Acknowledgement sent back to the payment gateway.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
}

impl WebhookAck {
    pub fn processed() -> Self {
        Self {
            ok: true,
            ignored: false,
        }
    }

    pub fn ignored() -> Self {
        Self {
            ok: true,
            ignored: true,
        }
    }
}
