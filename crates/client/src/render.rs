use std::fmt::Write;

use rail_protocol::{BookingStatus, Receipt, SeatBooking, ServerHello};

pub fn receipt_line(receipt: &Receipt) -> String {
    let status = match receipt.booking_status {
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Cancelled => "cancelled",
    };
    format!(
        "{id}  {from} -> {to}  {first} {last} <{email}>  {section}/{seat}  ${price:.2}  {status}",
        id = receipt.receipt_id,
        from = receipt.from,
        to = receipt.to,
        first = receipt.user.first_name,
        last = receipt.user.last_name,
        email = receipt.user.email,
        section = receipt.section,
        seat = receipt.seat,
        price = receipt.price_paid,
    )
}

pub fn receipts_table(receipts: &[Receipt]) -> String {
    if receipts.is_empty() {
        return "no receipts".to_string();
    }
    receipts
        .iter()
        .map(receipt_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn seat_table(seats: &[SeatBooking]) -> String {
    let mut out = String::new();
    for seat in seats {
        let holder = match &seat.user {
            Some(user) => format!("{} {} ({})", user.first_name, user.last_name, user.user_id),
            None if seat.seat_available => "free".to_string(),
            None => "held".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<4} {:<7} {:<36} {}",
            seat.section_name, seat.seat_number, seat.seat_id, holder
        );
    }
    let free = seats.iter().filter(|seat| seat.seat_available).count();
    let _ = write!(out, "{free}/{} seats available", seats.len());
    out
}

pub fn trains_summary(hello: &ServerHello) -> String {
    let mut out = format!("server {}", hello.server_version);
    for train in &hello.trains {
        let _ = write!(
            out,
            "\n{} {} -> {} fare ${:.2}",
            train.id, train.from, train.to, train.price
        );
        for section in &train.sections {
            let _ = write!(
                out,
                "\n  {} ({}): {} free",
                section.id, section.name, section.available_seats
            );
        }
    }
    out
}
