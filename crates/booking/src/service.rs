//! The five booking operations.
//!
//! Each operation validates its input and resolves every entity it needs before touching
//! the store, so a returned error always leaves the store as it was.

use rail_common::ids::new_receipt_id;

use crate::error::{BookingError, Result};
use crate::model::{BookingStatus, Receipt, ReceiptView, SeatPos, SeatStatus, UserProfile};
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct PurchaseOrder {
    pub origin: String,
    pub destination: String,
    pub user: Option<UserProfile>,
    /// Zero means "charge the train's fare".
    pub price_paid: f64,
    pub discount_code: Option<String>,
    pub train_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SeatChange {
    pub receipt_id: String,
    pub new_seat_id: String,
    pub new_section_id: String,
    pub new_train_id: Option<String>,
}

pub fn purchase_booking(store: &mut Store, order: PurchaseOrder) -> Result<ReceiptView> {
    let user = match &order.user {
        Some(user) if !blank(&order.origin) && !blank(&order.destination) && !blank(&user.id) => {
            user
        }
        _ => {
            return Err(BookingError::InvalidRequest(
                "origin, destination and user are required".to_string(),
            ))
        }
    };

    let train = match order.train_id.as_deref().filter(|id| !blank(id)) {
        Some(train_id) => {
            let train = store
                .train(train_id)
                .ok_or_else(|| BookingError::TrainNotFound(train_id.to_string()))?;
            if !train.serves(&order.origin, &order.destination) {
                return Err(BookingError::InvalidRequest(format!(
                    "train {} does not run {} -> {}",
                    train.id, order.origin, order.destination
                )));
            }
            train
        }
        None => store
            .train_for_route(&order.origin, &order.destination)
            .ok_or_else(|| {
                BookingError::TrainNotFound(format!("{} -> {}", order.origin, order.destination))
            })?,
    };

    let price = store
        .discounts
        .apply(order.price_paid, order.discount_code.as_deref())?;

    let pos = allocate_seat(store, &train.id).ok_or(BookingError::NoSeatsAvailable)?;
    let train_id = train.id.clone();

    let seat = store
        .seat_at_mut(pos)
        .ok_or(BookingError::NoSeatsAvailable)?;
    seat.claim(&user.id);
    let receipt = Receipt {
        id: new_receipt_id(),
        train_id,
        origin: order.origin.clone(),
        destination: order.destination.clone(),
        seat_id: seat.id.clone(),
        seat_number: seat.seat_number.clone(),
        section_id: seat.section_id.clone(),
        section_name: seat.section_name.clone(),
        user_id: user.id.clone(),
        price,
        status: BookingStatus::Confirmed,
    };

    store.register_user(user);
    if let Some(owner) = store.user_mut(&user.id) {
        owner.receipts.push(receipt.id.clone());
    }
    let view = receipt_view(store, &receipt);
    store.receipts.insert(receipt.id.clone(), receipt);
    Ok(view)
}

pub fn show_receipts(store: &Store, user_id: &str) -> Result<Vec<ReceiptView>> {
    if blank(user_id) {
        return Err(BookingError::InvalidRequest("user id is required".to_string()));
    }
    let user = store
        .user(user_id)
        .ok_or_else(|| BookingError::UserNotFound(user_id.to_string()))?;
    user.receipts
        .iter()
        .map(|receipt_id| store.receipt(receipt_id).map(|r| receipt_view(store, r)))
        .collect()
}

pub fn section_booking_details(
    store: &Store,
    section_id: &str,
    train_id: Option<&str>,
) -> Result<Vec<SeatStatus>> {
    if blank(section_id) {
        return Err(BookingError::InvalidRequest("section id is required".to_string()));
    }
    let train = match train_id.filter(|id| !blank(id)) {
        Some(train_id) => store
            .train(train_id)
            .ok_or_else(|| BookingError::TrainNotFound(train_id.to_string()))?,
        None => store
            .default_train()
            .ok_or_else(|| BookingError::SectionNotFound(section_id.to_string()))?,
    };
    let section = train
        .section(section_id)
        .ok_or_else(|| BookingError::SectionNotFound(section_id.to_string()))?;

    Ok(section
        .seats
        .iter()
        .map(|seat| SeatStatus {
            seat_id: seat.id.clone(),
            seat_number: seat.seat_number.clone(),
            section_id: seat.section_id.clone(),
            section_name: seat.section_name.clone(),
            available: seat.available,
            occupant: seat
                .occupant
                .as_deref()
                .and_then(|user_id| store.user(user_id))
                .map(UserProfile::from),
        })
        .collect())
}

pub fn update_seat_booking(store: &mut Store, change: SeatChange) -> Result<ReceiptView> {
    if blank(&change.receipt_id) || blank(&change.new_seat_id) || blank(&change.new_section_id)
    {
        return Err(BookingError::InvalidRequest(
            "receipt id, new seat id and new section id are required".to_string(),
        ));
    }
    let receipt = store.receipt(&change.receipt_id)?;
    if receipt.is_cancelled() {
        return Err(BookingError::AlreadyCancelled(receipt.id.clone()));
    }

    let target_train = match change.new_train_id.as_deref().filter(|id| !blank(id)) {
        Some(train_id) => {
            let train = store
                .train(train_id)
                .ok_or_else(|| BookingError::TrainNotFound(train_id.to_string()))?;
            if !train.serves(&receipt.origin, &receipt.destination) {
                return Err(BookingError::InvalidRequest(format!(
                    "train {} does not run {} -> {}",
                    train.id, receipt.origin, receipt.destination
                )));
            }
            train.id.clone()
        }
        None => receipt.train_id.clone(),
    };

    let (new_pos, new_seat) = store
        .locate_seat(&target_train, &change.new_section_id, &change.new_seat_id)
        .and_then(|pos| {
            store
                .seat_at(pos)
                .filter(|seat| seat.available)
                .map(|seat| (pos, seat.clone()))
        })
        .ok_or_else(|| BookingError::SeatUnavailable(change.new_seat_id.clone()))?;
    let old_pos = store.locate_seat(&receipt.train_id, &receipt.section_id, &receipt.seat_id);
    let user_id = receipt.user_id.clone();

    move_occupant(store, old_pos, new_pos, &user_id);

    let receipt = store.receipt_mut(&change.receipt_id)?;
    receipt.train_id = target_train;
    receipt.seat_id = new_seat.id;
    receipt.seat_number = new_seat.seat_number;
    receipt.section_id = new_seat.section_id;
    receipt.section_name = new_seat.section_name;
    let receipt = receipt.clone();

    Ok(receipt_view(store, &receipt))
}

pub fn delete_booking(store: &mut Store, receipt_id: &str) -> Result<bool> {
    if blank(receipt_id) {
        return Err(BookingError::InvalidRequest("receipt id is required".to_string()));
    }
    let receipt = store.receipt(receipt_id)?;
    if receipt.is_cancelled() {
        return Err(BookingError::AlreadyCancelled(receipt.id.clone()));
    }
    let seat_pos = store.locate_seat(&receipt.train_id, &receipt.section_id, &receipt.seat_id);

    if let Some(pos) = seat_pos {
        if let Some(seat) = store.seat_at_mut(pos) {
            seat.release();
        }
    }
    store.receipt_mut(receipt_id)?.status = BookingStatus::Cancelled;
    Ok(true)
}

/// First free seat of `train_id`, section-major then seat-minor.
fn allocate_seat(store: &Store, train_id: &str) -> Option<SeatPos> {
    let train = store.trains.iter().position(|train| train.id == train_id)?;
    store.trains[train]
        .sections
        .iter()
        .enumerate()
        .filter(|(_, section)| section.available_seats() > 0)
        .find_map(|(section, entry)| {
            entry.first_available().map(|seat| SeatPos {
                train,
                section,
                seat,
            })
        })
}

fn move_occupant(store: &mut Store, from: Option<SeatPos>, to: SeatPos, user_id: &str) {
    if let Some(pos) = from {
        if let Some(seat) = store.seat_at_mut(pos) {
            seat.release();
        }
    }
    if let Some(seat) = store.seat_at_mut(to) {
        seat.claim(user_id);
    }
}

fn receipt_view(store: &Store, receipt: &Receipt) -> ReceiptView {
    let user = store
        .user(&receipt.user_id)
        .map(UserProfile::from)
        .unwrap_or_else(|| UserProfile {
            id: receipt.user_id.clone(),
            ..UserProfile::default()
        });
    ReceiptView {
        receipt_id: receipt.id.clone(),
        origin: receipt.origin.clone(),
        destination: receipt.destination.clone(),
        user,
        seat_number: receipt.seat_number.clone(),
        section_name: receipt.section_name.clone(),
        price_paid: receipt.price,
        status: receipt.status,
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}
