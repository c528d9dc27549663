use clap::Parser;
use digitserve::{server, ServeArgs, ServerConfig};
use log::{error, info};

#[tokio::main]
async fn main() {
    digitserve::init_logger();
    let args = ServeArgs::parse();

    info!("=== Starting MNIST Digit Recognition API ===");
    let config = ServerConfig::from(args);

    if let Err(e) = server::serve(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
