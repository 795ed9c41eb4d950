use clap::Parser;

use rail_booking::Store;
use rail_common::config::{load_config, ServerConfig};
use rail_common::logging;

use crate::server::BookingServer;

mod handlers;
mod server;

#[derive(Parser, Debug)]
#[command(name = "rail-server")]
struct Args {
    #[arg(long, default_value = "config/server.toml")]
    config: String,

    /// Overrides `bind_addr` from the config file.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("info");

    let args = Args::parse();
    let mut config: ServerConfig = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let store = Store::from_config(&config)?;
    tracing::info!(
        trains = store.trains.len(),
        users = store.users.len(),
        discount_required = store.discounts.is_required(),
        "store seeded"
    );

    let server = BookingServer::new(config, store);
    server.run().await
}
