use uuid::Uuid;

pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn new_receipt_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn new_seat_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
