use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::messages::{method, Envelope, ServerError};

pub fn new_envelope<T: Serialize>(
    message_type: &str,
    id: &str,
    ts: i64,
    payload: &T,
) -> anyhow::Result<Envelope> {
    let payload_value = serde_json::to_value(payload)?;
    Ok(Envelope {
        message_type: message_type.to_string(),
        id: id.to_string(),
        ts,
        reply_to: None,
        payload: payload_value,
    })
}

/// Builds the `<method>.ok` reply correlated with `request`.
pub fn reply_envelope<T: Serialize>(
    request: &Envelope,
    id: &str,
    ts: i64,
    payload: &T,
) -> anyhow::Result<Envelope> {
    let mut env = new_envelope(&method::ok(&request.message_type), id, ts, payload)?;
    env.reply_to = Some(request.id.clone());
    Ok(env)
}

pub fn error_envelope(
    reply_to: Option<&str>,
    id: &str,
    ts: i64,
    code: &str,
    message: &str,
) -> anyhow::Result<Envelope> {
    let payload = ServerError {
        code: code.to_string(),
        message: message.to_string(),
    };
    let mut env = new_envelope(method::ERROR, id, ts, &payload)?;
    env.reply_to = reply_to.map(str::to_string);
    Ok(env)
}

pub fn open_payload<T: DeserializeOwned>(envelope: &Envelope) -> anyhow::Result<T> {
    Ok(serde_json::from_value(envelope.payload.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{PurchaseBookingRequest, ShowReceiptsRequest, User};

    #[test]
    fn reply_is_correlated_with_request() {
        let request = new_envelope(
            method::SHOW_RECEIPTS,
            "req-1",
            10,
            &ShowReceiptsRequest {
                user_id: "2".to_string(),
            },
        )
        .unwrap();
        let reply = reply_envelope(&request, "rep-1", 11, &serde_json::json!({"receipts": []})).unwrap();
        assert_eq!(reply.message_type, "booking.show_receipts.ok");
        assert_eq!(reply.reply_to.as_deref(), Some("req-1"));
    }

    #[test]
    fn error_envelope_carries_code() {
        let env = error_envelope(Some("req-7"), "e-1", 5, "no_seats_available", "no seats").unwrap();
        assert_eq!(env.message_type, method::ERROR);
        let err: ServerError = open_payload(&env).unwrap();
        assert_eq!(err.code, "no_seats_available");
        assert_eq!(env.reply_to.as_deref(), Some("req-7"));
    }

    #[test]
    fn missing_request_fields_decode_as_empty() {
        let raw = r#"{"type":"booking.purchase","id":"x","ts":1,"payload":{"to":"France"}}"#;
        let env: Envelope = serde_json::from_str(raw).unwrap();
        assert!(env.reply_to.is_none());
        let req: PurchaseBookingRequest = open_payload(&env).unwrap();
        assert_eq!(req.from, "");
        assert_eq!(req.to, "France");
        assert!(req.user.is_none());
        assert!(req.discount_coupon.is_none());
        assert_eq!(req.price_paid, 0.0);
    }

    #[test]
    fn optional_fields_are_omitted_on_the_wire() {
        let req = PurchaseBookingRequest {
            from: "London".to_string(),
            to: "France".to_string(),
            user: Some(User::default()),
            price_paid: 20.0,
            discount_coupon: None,
            train_id: None,
        };
        let env = new_envelope(method::PURCHASE, "id", 0, &req).unwrap();
        let text = serde_json::to_string(&env).unwrap();
        assert!(!text.contains("discount_coupon"));
        assert!(!text.contains("train_id"));
        assert!(!text.contains("reply_to"));
    }
}
