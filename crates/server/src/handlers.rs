use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use rail_booking::{
    delete_booking, purchase_booking, section_booking_details, show_receipts, update_seat_booking,
    BookingError, BookingStatus, PurchaseOrder, ReceiptView, SeatChange, SeatStatus, Train,
    UserProfile,
};
use rail_common::ids::{new_message_id, now_ms};
use rail_protocol as wire;
use rail_protocol::envelope::{error_envelope, reply_envelope};
use rail_protocol::{method, Envelope};

use crate::server::SharedStore;

#[derive(Debug, Error)]
enum CallError {
    #[error("malformed payload: {0}")]
    BadRequest(serde_json::Error),

    #[error("unknown method {0}")]
    UnknownMethod(String),

    #[error("encoding reply: {0}")]
    Encode(serde_json::Error),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl CallError {
    fn code(&self) -> &'static str {
        match self {
            CallError::BadRequest(_) => "bad_request",
            CallError::UnknownMethod(_) => "unknown_method",
            CallError::Encode(_) => "internal",
            CallError::Booking(err) => err.code(),
        }
    }
}

/// Runs the booking call named by `request` and builds the correlated reply.
///
/// Booking failures come back as `server.error` envelopes; only envelope encoding errors
/// surface as `Err`.
pub async fn dispatch(request: &Envelope, store: &SharedStore) -> anyhow::Result<Envelope> {
    let outcome = match request.message_type.as_str() {
        method::PURCHASE => handle_purchase(request, store).await,
        method::SHOW_RECEIPTS => handle_show_receipts(request, store).await,
        method::SECTION_DETAILS => handle_section_details(request, store).await,
        method::UPDATE_SEAT => handle_update_seat(request, store).await,
        method::DELETE => handle_delete(request, store).await,
        other => Err(CallError::UnknownMethod(other.to_string())),
    };

    match outcome {
        Ok(payload) => reply_envelope(request, &new_message_id(), now_ms(), &payload),
        Err(err) => {
            tracing::warn!(
                request = %request.id,
                method = %request.message_type,
                code = err.code(),
                "call failed: {err}"
            );
            error_envelope(
                Some(&request.id),
                &new_message_id(),
                now_ms(),
                err.code(),
                &err.to_string(),
            )
        }
    }
}

pub async fn server_hello(store: &SharedStore) -> wire::ServerHello {
    let store = store.read().await;
    wire::ServerHello {
        server_version: wire::PROTOCOL_VERSION.to_string(),
        trains: store.trains.iter().map(train_info).collect(),
    }
}

async fn handle_purchase(request: &Envelope, store: &SharedStore) -> Result<Value, CallError> {
    let req: wire::PurchaseBookingRequest = decode(request)?;
    let receipt = purchase_booking(&mut *store.write().await, purchase_order(req))?;
    tracing::info!(
        receipt = %receipt.receipt_id,
        user = %receipt.user.id,
        seat = %receipt.seat_number,
        section = %receipt.section_name,
        price = receipt.price_paid,
        "booking purchased"
    );
    encode(&wire::PurchaseBookingResponse {
        receipt: wire_receipt(receipt),
    })
}

async fn handle_show_receipts(request: &Envelope, store: &SharedStore) -> Result<Value, CallError> {
    let req: wire::ShowReceiptsRequest = decode(request)?;
    let receipts = show_receipts(&*store.read().await, &req.user_id)?;
    encode(&wire::ShowReceiptsResponse {
        receipts: receipts.into_iter().map(wire_receipt).collect(),
    })
}

async fn handle_section_details(
    request: &Envelope,
    store: &SharedStore,
) -> Result<Value, CallError> {
    let req: wire::SectionBookingDetailsRequest = decode(request)?;
    let seats =
        section_booking_details(&*store.read().await, &req.section_id, req.train_id.as_deref())?;
    encode(&wire::SectionBookingDetailsResponse {
        seat_bookings: seats.into_iter().map(seat_booking).collect(),
    })
}

async fn handle_update_seat(request: &Envelope, store: &SharedStore) -> Result<Value, CallError> {
    let req: wire::UpdateSeatBookingRequest = decode(request)?;
    let change = SeatChange {
        receipt_id: req.receipt_id,
        new_seat_id: req.new_seat_id,
        new_section_id: req.new_section_id,
        new_train_id: req.new_train_id,
    };
    let receipt = update_seat_booking(&mut *store.write().await, change)?;
    tracing::info!(
        receipt = %receipt.receipt_id,
        seat = %receipt.seat_number,
        section = %receipt.section_name,
        "booking moved"
    );
    encode(&wire::UpdateSeatBookingResponse {
        updated_receipt: wire_receipt(receipt),
    })
}

async fn handle_delete(request: &Envelope, store: &SharedStore) -> Result<Value, CallError> {
    let req: wire::DeleteBookingRequest = decode(request)?;
    let deleted = delete_booking(&mut *store.write().await, &req.receipt_id)?;
    tracing::info!(receipt = %req.receipt_id, "booking cancelled");
    encode(&wire::DeleteBookingResponse {
        delete_status: deleted,
    })
}

fn decode<T: serde::de::DeserializeOwned>(request: &Envelope) -> Result<T, CallError> {
    serde_json::from_value(request.payload.clone()).map_err(CallError::BadRequest)
}

fn encode<T: Serialize>(payload: &T) -> Result<Value, CallError> {
    serde_json::to_value(payload).map_err(CallError::Encode)
}

fn purchase_order(req: wire::PurchaseBookingRequest) -> PurchaseOrder {
    PurchaseOrder {
        origin: req.from,
        destination: req.to,
        user: req.user.map(|user| UserProfile {
            id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }),
        price_paid: req.price_paid,
        discount_code: req.discount_coupon,
        train_id: req.train_id,
    }
}

fn wire_user(user: UserProfile) -> wire::User {
    wire::User {
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
    }
}

fn wire_receipt(receipt: ReceiptView) -> wire::Receipt {
    wire::Receipt {
        receipt_id: receipt.receipt_id,
        from: receipt.origin,
        to: receipt.destination,
        user: wire_user(receipt.user),
        seat: receipt.seat_number,
        section: receipt.section_name,
        price_paid: receipt.price_paid,
        booking_status: match receipt.status {
            BookingStatus::Confirmed => wire::BookingStatus::Confirmed,
            BookingStatus::Cancelled => wire::BookingStatus::Cancelled,
        },
    }
}

fn seat_booking(seat: SeatStatus) -> wire::SeatBooking {
    wire::SeatBooking {
        seat_id: seat.seat_id,
        seat_number: seat.seat_number,
        section_id: seat.section_id,
        section_name: seat.section_name,
        seat_available: seat.available,
        user: seat.occupant.map(wire_user),
    }
}

fn train_info(train: &Train) -> wire::TrainInfo {
    wire::TrainInfo {
        id: train.id.clone(),
        from: train.origin.clone(),
        to: train.destination.clone(),
        price: train.price,
        sections: train
            .sections
            .iter()
            .map(|section| wire::SectionInfo {
                id: section.id.clone(),
                name: section.name.clone(),
                available_seats: section.available_seats(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use rail_booking::store::generate_train;
    use rail_booking::{DiscountBook, Store};
    use rail_protocol::envelope::{new_envelope, open_payload};
    use tokio::sync::RwLock;

    use super::*;

    fn shared_store(seats: usize) -> SharedStore {
        let train = generate_train("T1", "London", "France", 1, seats, 20.0).unwrap();
        Arc::new(RwLock::new(Store::new(
            vec![train],
            Vec::new(),
            DiscountBook::new(false, HashMap::from([("SAVE5".to_string(), 5.0)])),
        )))
    }

    fn call<T: Serialize>(method: &str, payload: &T) -> Envelope {
        new_envelope(method, &new_message_id(), now_ms(), payload).unwrap()
    }

    fn purchase(user_id: &str) -> Envelope {
        call(
            method::PURCHASE,
            &wire::PurchaseBookingRequest {
                from: "London".to_string(),
                to: "France".to_string(),
                user: Some(wire::User {
                    user_id: user_id.to_string(),
                    first_name: "Alice".to_string(),
                    last_name: "Smith".to_string(),
                    email: "alice@example.com".to_string(),
                }),
                price_paid: 20.0,
                discount_coupon: Some("SAVE5".to_string()),
                train_id: None,
            },
        )
    }

    fn error_code(reply: &Envelope) -> String {
        assert_eq!(reply.message_type, method::ERROR);
        open_payload::<wire::ServerError>(reply).unwrap().code
    }

    #[tokio::test]
    async fn purchase_reply_is_correlated() {
        let store = shared_store(2);
        let request = purchase("1");
        let reply = dispatch(&request, &store).await.unwrap();

        assert_eq!(reply.message_type, "booking.purchase.ok");
        assert_eq!(reply.reply_to.as_deref(), Some(request.id.as_str()));
        let body: wire::PurchaseBookingResponse = open_payload(&reply).unwrap();
        assert_eq!(body.receipt.seat, "Seat1");
        assert_eq!(body.receipt.section, "S1");
        assert_eq!(body.receipt.price_paid, 15.0);
        assert_eq!(body.receipt.booking_status, wire::BookingStatus::Confirmed);
        assert_eq!(body.receipt.user.first_name, "Alice");
    }

    #[tokio::test]
    async fn booking_errors_map_to_codes() {
        let store = shared_store(1);
        dispatch(&purchase("1"), &store).await.unwrap();

        let full = dispatch(&purchase("2"), &store).await.unwrap();
        assert_eq!(error_code(&full), "no_seats_available");

        let missing = dispatch(
            &call(
                method::SHOW_RECEIPTS,
                &wire::ShowReceiptsRequest {
                    user_id: "404".to_string(),
                },
            ),
            &store,
        )
        .await
        .unwrap();
        assert_eq!(error_code(&missing), "user_not_found");

        let empty = dispatch(
            &call(method::DELETE, &wire::DeleteBookingRequest::default()),
            &store,
        )
        .await
        .unwrap();
        assert_eq!(error_code(&empty), "invalid_request");
    }

    #[tokio::test]
    async fn malformed_and_unknown_calls() {
        let store = shared_store(1);
        let malformed = call(method::PURCHASE, &serde_json::json!({ "price_paid": "lots" }));
        let reply = dispatch(&malformed, &store).await.unwrap();
        assert_eq!(error_code(&reply), "bad_request");
        assert_eq!(reply.reply_to.as_deref(), Some(malformed.id.as_str()));

        let unknown = call("booking.refund", &serde_json::json!({}));
        let reply = dispatch(&unknown, &store).await.unwrap();
        assert_eq!(error_code(&reply), "unknown_method");
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let store = shared_store(3);
        let reply = dispatch(&purchase("1"), &store).await.unwrap();
        let receipt = open_payload::<wire::PurchaseBookingResponse>(&reply)
            .unwrap()
            .receipt;

        let seats = dispatch(
            &call(
                method::SECTION_DETAILS,
                &wire::SectionBookingDetailsRequest {
                    section_id: "S1".to_string(),
                    train_id: None,
                },
            ),
            &store,
        )
        .await
        .unwrap();
        let seats = open_payload::<wire::SectionBookingDetailsResponse>(&seats)
            .unwrap()
            .seat_bookings;
        assert_eq!(seats.len(), 3);
        assert!(!seats[0].seat_available);
        assert_eq!(
            seats[0].user.as_ref().map(|u| u.user_id.as_str()),
            Some("1")
        );
        let free = seats
            .iter()
            .find(|seat| seat.seat_available)
            .map(|seat| seat.seat_id.clone())
            .unwrap();

        let moved = dispatch(
            &call(
                method::UPDATE_SEAT,
                &wire::UpdateSeatBookingRequest {
                    receipt_id: receipt.receipt_id.clone(),
                    new_seat_id: free,
                    new_section_id: "S1".to_string(),
                    new_train_id: None,
                },
            ),
            &store,
        )
        .await
        .unwrap();
        let moved = open_payload::<wire::UpdateSeatBookingResponse>(&moved)
            .unwrap()
            .updated_receipt;
        assert_eq!(moved.seat, "Seat2");

        let delete = call(
            method::DELETE,
            &wire::DeleteBookingRequest {
                receipt_id: receipt.receipt_id.clone(),
            },
        );
        let deleted = dispatch(&delete, &store).await.unwrap();
        assert!(
            open_payload::<wire::DeleteBookingResponse>(&deleted)
                .unwrap()
                .delete_status
        );
        let again = dispatch(&delete, &store).await.unwrap();
        assert_eq!(error_code(&again), "already_cancelled");
        assert!(store.read().await.check_consistency().is_ok());
    }

    #[test]
    fn encode_failures_use_internal_code() {
        let err = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(CallError::Encode(err).code(), "internal");
    }

    #[tokio::test]
    async fn hello_lists_trains() {
        let store = shared_store(4);
        dispatch(&purchase("1"), &store).await.unwrap();
        let hello = server_hello(&store).await;
        assert_eq!(hello.trains.len(), 1);
        assert_eq!(hello.trains[0].from, "London");
        assert_eq!(hello.trains[0].sections[0].available_seats, 3);
    }
}
