#[path = "sgpt/app/mod.rs"]
mod app;
#[path = "sgpt/args.rs"]
mod args;
#[path = "sgpt/config/mod.rs"]
mod config;
#[path = "sgpt/integration.rs"]
mod integration;
#[path = "sgpt/logging.rs"]
mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
