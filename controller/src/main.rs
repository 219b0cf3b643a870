mod app;
mod audio;
mod display;
mod net;
mod portal;
mod remote;
mod sensor;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
