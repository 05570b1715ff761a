mod api;
mod app;
mod capture;
mod commands;
mod config;
mod grading;
mod logging;
mod pipeline;
mod recordings;
mod setup;
mod ui;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    app::run().await
}
