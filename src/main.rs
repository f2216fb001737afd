//! carlot - vehicle listing scraper.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    carlot::cli::run().await
}
