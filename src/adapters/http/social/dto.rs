//! HTTP DTOs for social endpoints.

use serde::{Deserialize, Serialize};

use crate::application::Delivery;
use crate::domain::foundation::UpdateId;
use crate::domain::social::{GuestVisit, Message};

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default)]
    pub invite: bool,
}

/// How the recipient was reached.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum DeliveryResponse {
    Live,
    Stored { update_id: UpdateId, forwarded: bool },
}

impl From<Delivery> for DeliveryResponse {
    fn from(delivery: Delivery) -> Self {
        match delivery {
            Delivery::Live => DeliveryResponse::Live,
            Delivery::Stored {
                update_id,
                forwarded,
            } => DeliveryResponse::Stored {
                update_id,
                forwarded,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SentMessageResponse {
    pub message: Message,
    pub delivery: DeliveryResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuestVisitResponse {
    pub visit: GuestVisit,
    pub delivery: DeliveryResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invite_defaults_to_false() {
        let req: SendMessageRequest = serde_json::from_value(json!({"text": "hi"})).unwrap();
        assert!(!req.invite);
    }

    #[test]
    fn delivery_is_tagged_by_route() {
        let live = serde_json::to_value(DeliveryResponse::from(Delivery::Live)).unwrap();
        assert_eq!(live, json!({"via": "live"}));

        let update_id = UpdateId::new();
        let stored = serde_json::to_value(DeliveryResponse::from(Delivery::Stored {
            update_id,
            forwarded: false,
        }))
        .unwrap();
        assert_eq!(stored["via"], "stored");
        assert_eq!(stored["update_id"], json!(update_id));
        assert_eq!(stored["forwarded"], false);
    }
}
