use clap::{Parser, Subcommand};

use rail_common::config::{load_config, ClientConfig};
use rail_common::logging;
use rail_protocol as wire;
use rail_protocol::method;

use crate::net::Connection;
use crate::render::{receipt_line, receipts_table, seat_table, trains_summary};

mod demo;
mod net;
mod render;

#[derive(Parser, Debug)]
#[command(name = "rail-client")]
struct Args {
    #[arg(long, default_value = "config/client.toml")]
    config: String,

    /// Overrides `server_url` from the config file.
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List trains and free seats per section.
    Trains,
    /// Buy a ticket.
    Purchase {
        #[arg(long, default_value = "London")]
        from: String,
        #[arg(long, default_value = "France")]
        to: String,
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Defaults to the fare the server advertised for the train.
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        coupon: Option<String>,
        #[arg(long)]
        train: Option<String>,
    },
    /// Show every receipt a user holds.
    Receipts { user_id: String },
    /// Show seat occupancy for one section.
    Section {
        section_id: String,
        #[arg(long)]
        train: Option<String>,
    },
    /// Move a booking to another seat.
    Update {
        receipt_id: String,
        seat_id: String,
        section_id: String,
        #[arg(long)]
        train: Option<String>,
    },
    /// Cancel a booking.
    Cancel { receipt_id: String },
    /// Run the scripted booking walkthrough.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("warn");

    let args = Args::parse();
    let mut config: ClientConfig = load_config(&args.config)?;
    if let Some(server) = args.server {
        config.server_url = server;
    }

    if let Command::Demo = args.command {
        return demo::run(&config).await;
    }

    let mut conn = Connection::connect(&config).await?;
    let result = run_command(&mut conn, args.command).await;
    conn.close();
    result
}

async fn run_command(conn: &mut Connection, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Trains => println!("{}", trains_summary(&conn.hello)),
        Command::Purchase {
            from,
            to,
            user_id,
            first_name,
            last_name,
            email,
            price,
            coupon,
            train,
        } => {
            let price_paid = price
                .or_else(|| advertised_fare(&conn.hello, train.as_deref(), &from, &to))
                .unwrap_or_default();
            let request = wire::PurchaseBookingRequest {
                from,
                to,
                user: Some(wire::User {
                    user_id,
                    first_name,
                    last_name,
                    email,
                }),
                price_paid,
                discount_coupon: coupon,
                train_id: train,
            };
            let response: wire::PurchaseBookingResponse =
                conn.request(method::PURCHASE, &request).await?;
            println!("{}", receipt_line(&response.receipt));
        }
        Command::Receipts { user_id } => {
            let response: wire::ShowReceiptsResponse = conn
                .request(method::SHOW_RECEIPTS, &wire::ShowReceiptsRequest { user_id })
                .await?;
            println!("{}", receipts_table(&response.receipts));
        }
        Command::Section { section_id, train } => {
            let request = wire::SectionBookingDetailsRequest {
                section_id,
                train_id: train,
            };
            let response: wire::SectionBookingDetailsResponse =
                conn.request(method::SECTION_DETAILS, &request).await?;
            println!("{}", seat_table(&response.seat_bookings));
        }
        Command::Update {
            receipt_id,
            seat_id,
            section_id,
            train,
        } => {
            let request = wire::UpdateSeatBookingRequest {
                receipt_id,
                new_seat_id: seat_id,
                new_section_id: section_id,
                new_train_id: train,
            };
            let response: wire::UpdateSeatBookingResponse =
                conn.request(method::UPDATE_SEAT, &request).await?;
            println!("{}", receipt_line(&response.updated_receipt));
        }
        Command::Cancel { receipt_id } => {
            let response: wire::DeleteBookingResponse = conn
                .request(method::DELETE, &wire::DeleteBookingRequest { receipt_id })
                .await?;
            println!("deleted: {}", response.delete_status);
        }
        Command::Demo => anyhow::bail!("demo opens its own connections"),
    }
    Ok(())
}

/// Fare from `server.hello` for the named train, or the first train running the route.
fn advertised_fare(
    hello: &wire::ServerHello,
    train: Option<&str>,
    from: &str,
    to: &str,
) -> Option<f64> {
    hello
        .trains
        .iter()
        .find(|info| match train {
            Some(id) => info.id == id,
            None => info.from == from && info.to == to,
        })
        .map(|info| info.price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train(id: &str, to: &str, price: f64) -> wire::TrainInfo {
        wire::TrainInfo {
            id: id.to_string(),
            from: "London".to_string(),
            to: to.to_string(),
            price,
            sections: Vec::new(),
        }
    }

    #[test]
    fn fare_comes_from_matching_train() {
        let hello = wire::ServerHello {
            server_version: wire::PROTOCOL_VERSION.to_string(),
            trains: vec![train("T1", "France", 20.0), train("T2", "Spain", 35.0)],
        };
        assert_eq!(advertised_fare(&hello, None, "London", "Spain"), Some(35.0));
        assert_eq!(advertised_fare(&hello, Some("T1"), "London", "France"), Some(20.0));
        assert_eq!(advertised_fare(&hello, None, "Paris", "Rome"), None);
    }
}
