#[tokio::main]
pub async fn main() -> Result<(), anyhow::Error> {
    supply_accounting::start_server().await?;
    Ok(())
}
