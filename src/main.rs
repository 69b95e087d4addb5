#[tokio::main]
async fn main() -> anyhow::Result<()> {
    autofisher_lib::run().await
}
