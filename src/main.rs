use std::process;

#[tokio::main]
async fn main() {
    if lux_cli::cli::app::run().await.is_err() {
        process::exit(1);
    }
}
