//! Homeroom CLI entry point.

mod api;
mod driver;

use clap::Parser;
use homeroom_app::{App, Bridge, Runtime};
use homeroom_client::{Session, SystemClock};
use homeroom_proto::{Participant, UserId};
use tracing_subscriber::EnvFilter;

use crate::{api::HttpApi, driver::LineDriver};

/// Line-oriented Homeroom chat client
#[derive(Parser, Debug)]
#[command(name = "homeroom")]
#[command(about = "Line-oriented client for the Homeroom chat protocol")]
#[command(version)]
struct Args {
    /// Socket endpoint for the real-time link
    #[arg(long, env = "HOMEROOM_SOCKET_URL", default_value = "ws://localhost:5000")]
    socket_url: String,

    /// Base URL of the chat REST API
    #[arg(long, env = "HOMEROOM_API_URL", default_value = "http://localhost:5000/api")]
    api_url: String,

    /// User id to register the session as
    #[arg(long)]
    user_id: String,

    /// Display name shown on messages
    #[arg(long, default_value = "anonymous")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let user = Participant { id: UserId::new(&args.user_id), name: args.name, email: None };
    let user_id = user.id.clone();

    let session = Session::new(SystemClock, args.socket_url);
    let bridge = Bridge::new(session);
    let app = App::new(user);
    let driver = LineDriver::new(HttpApi::new(args.api_url), user_id);

    Ok(Runtime::new(driver, app, bridge).run().await?)
}
