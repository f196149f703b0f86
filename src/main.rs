mod app;
mod capture;
mod commands;
mod config;
mod history;
mod logging;
mod media;
mod session;
mod setup;
#[cfg(test)]
mod test_support;
mod transcode;
mod ui;
mod views;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("Fatal: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
