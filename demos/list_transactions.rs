use anyhow::Context;
use mypos_rust::{
    apis::transactions::{ListTransactionsRequestBuilder, TransactionType},
    config::ClientConfig,
};

async fn run() -> anyhow::Result<()> {
    // Credentials and URL overrides come from `MYPOS_*` environment variables
    let config = ClientConfig::from_env().context("Failed to read the client configuration")?;

    // Setup myPOS client, failing early on invalid credentials
    let client = config.into_builder()?.connect().await?;

    let request = ListTransactionsRequestBuilder::default()
        .size(10u32)
        .transaction_types(vec![TransactionType::PosPurchase, TransactionType::Refund])
        .build()?;

    let res = client.transactions.list(&request).await?;
    tracing::info!(
        "Got {} of {} transactions",
        res.transactions.len(),
        res.pagination.total
    );

    for transaction in &res.transactions {
        tracing::info!(
            "{} {} {}{} {}",
            transaction.date,
            transaction.payment_reference,
            transaction.sign,
            transaction.transaction_amount,
            transaction.transaction_currency
        );

        let details = client
            .transactions
            .get_details(&transaction.payment_reference)
            .await?;
        for detail in details.details {
            tracing::info!("    {}: {}", detail.label, detail.value);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

    if let Err(e) = run().await {
        tracing::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}
