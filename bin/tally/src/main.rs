//! Tally usage ledger binary.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tally_cli::run().await
}
