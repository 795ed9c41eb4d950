use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "0.1";

/// Message types carried in `Envelope::message_type`.
pub mod method {
    pub const HELLO: &str = "server.hello";
    pub const ERROR: &str = "server.error";

    pub const PURCHASE: &str = "booking.purchase";
    pub const SHOW_RECEIPTS: &str = "booking.show_receipts";
    pub const SECTION_DETAILS: &str = "booking.section_details";
    pub const UPDATE_SEAT: &str = "booking.update_seat";
    pub const DELETE: &str = "booking.delete";

    /// Reply type for a successful call of `method`.
    pub fn ok(method: &str) -> String {
        format!("{method}.ok")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub id: String,
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_id: String,
    pub from: String,
    pub to: String,
    pub user: User,
    pub seat: String,
    pub section: String,
    pub price_paid: f64,
    pub booking_status: BookingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseBookingRequest {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub price_paid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_coupon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseBookingResponse {
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowReceiptsRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowReceiptsResponse {
    pub receipts: Vec<Receipt>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionBookingDetailsRequest {
    #[serde(default)]
    pub section_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionBookingDetailsResponse {
    pub seat_bookings: Vec<SeatBooking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatBooking {
    pub seat_id: String,
    pub seat_number: String,
    pub section_id: String,
    pub section_name: String,
    pub seat_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSeatBookingRequest {
    #[serde(default)]
    pub receipt_id: String,
    #[serde(default)]
    pub new_seat_id: String,
    #[serde(default)]
    pub new_section_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_train_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSeatBookingResponse {
    pub updated_receipt: Receipt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteBookingRequest {
    #[serde(default)]
    pub receipt_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBookingResponse {
    pub delete_status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerHello {
    pub server_version: String,
    pub trains: Vec<TrainInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainInfo {
    pub id: String,
    pub from: String,
    pub to: String,
    pub price: f64,
    pub sections: Vec<SectionInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInfo {
    pub id: String,
    pub name: String,
    pub available_seats: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    pub code: String,
    pub message: String,
}
