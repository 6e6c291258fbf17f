#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aprs_daemon::run().await
}
