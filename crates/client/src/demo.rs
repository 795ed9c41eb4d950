use anyhow::Context;

use rail_common::config::ClientConfig;
use rail_protocol as wire;
use rail_protocol::method;

use crate::net::{error_code, Connection};
use crate::render::{receipt_line, receipts_table, seat_table};

fn demo_users() -> Vec<wire::User> {
    let bob = wire::User {
        user_id: "2".to_string(),
        first_name: "Bob".to_string(),
        last_name: "Johnson".to_string(),
        email: "bob@example.com".to_string(),
    };
    let alice = wire::User {
        user_id: "1".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Smith".to_string(),
        email: "alice@example.com".to_string(),
    };
    vec![bob.clone(), alice, bob]
}

async fn purchase_over_own_connection(
    config: ClientConfig,
    user: wire::User,
) -> anyhow::Result<wire::Receipt> {
    let mut conn = Connection::connect(&config).await?;
    let request = wire::PurchaseBookingRequest {
        from: "London".to_string(),
        to: "France".to_string(),
        user: Some(user),
        price_paid: 20.0,
        ..wire::PurchaseBookingRequest::default()
    };
    let response: wire::PurchaseBookingResponse =
        conn.request(method::PURCHASE, &request).await?;
    conn.close();
    Ok(response.receipt)
}

/// Walks the whole booking lifecycle against a running server.
pub async fn run(config: &ClientConfig) -> anyhow::Result<()> {
    println!("== purchasing concurrently ==");
    let tasks: Vec<_> = demo_users()
        .into_iter()
        .map(|user| tokio::spawn(purchase_over_own_connection(config.clone(), user)))
        .collect();
    for task in tasks {
        match task.await? {
            Ok(receipt) => println!("{}", receipt_line(&receipt)),
            Err(err) => tracing::warn!("purchase failed: {err:#}"),
        }
    }

    let mut conn = Connection::connect(config).await?;

    println!("\n== Bob's receipts ==");
    let receipts: wire::ShowReceiptsResponse = conn
        .request(
            method::SHOW_RECEIPTS,
            &wire::ShowReceiptsRequest {
                user_id: "2".to_string(),
            },
        )
        .await?;
    println!("{}", receipts_table(&receipts.receipts));
    let receipt_id = receipts
        .receipts
        .iter()
        .find(|receipt| receipt.booking_status == wire::BookingStatus::Confirmed)
        .map(|receipt| receipt.receipt_id.clone())
        .context("Bob holds no confirmed booking")?;

    println!("\n== section S1 ==");
    let s1: wire::SectionBookingDetailsResponse = conn
        .request(
            method::SECTION_DETAILS,
            &wire::SectionBookingDetailsRequest {
                section_id: "S1".to_string(),
                train_id: None,
            },
        )
        .await?;
    println!("{}", seat_table(&s1.seat_bookings));

    println!("\n== moving {receipt_id} to section S2 ==");
    let s2: wire::SectionBookingDetailsResponse = conn
        .request(
            method::SECTION_DETAILS,
            &wire::SectionBookingDetailsRequest {
                section_id: "S2".to_string(),
                train_id: None,
            },
        )
        .await?;
    let free = s2
        .seat_bookings
        .iter()
        .find(|seat| seat.seat_available)
        .context("no free seat in section S2")?;
    let update = wire::UpdateSeatBookingRequest {
        receipt_id: receipt_id.clone(),
        new_seat_id: free.seat_id.clone(),
        new_section_id: free.section_id.clone(),
        new_train_id: None,
    };
    let updated: wire::UpdateSeatBookingResponse =
        conn.request(method::UPDATE_SEAT, &update).await?;
    println!("{}", receipt_line(&updated.updated_receipt));

    println!("\n== cancelling {receipt_id} ==");
    let cancel = wire::DeleteBookingRequest {
        receipt_id: receipt_id.clone(),
    };
    let deleted: wire::DeleteBookingResponse = conn.request(method::DELETE, &cancel).await?;
    println!("deleted: {}", deleted.delete_status);

    println!("\n== touching the cancelled receipt ==");
    let again = conn
        .request::<_, wire::UpdateSeatBookingResponse>(method::UPDATE_SEAT, &update)
        .await;
    report_expected_failure("update", again);
    let again = conn
        .request::<_, wire::DeleteBookingResponse>(method::DELETE, &cancel)
        .await;
    report_expected_failure("cancel", again);

    conn.close();
    Ok(())
}

fn report_expected_failure<T>(what: &str, result: anyhow::Result<T>) {
    match result {
        Ok(_) => println!("{what}: unexpectedly succeeded"),
        Err(err) => match error_code(&err) {
            Some(code) => println!("{what}: rejected with {code}"),
            None => println!("{what}: failed: {err:#}"),
        },
    }
}
