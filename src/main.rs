pub mod api;
pub mod auth;
pub mod db;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    api::server::start_server(api::server::Config::from_env()).await;
}
