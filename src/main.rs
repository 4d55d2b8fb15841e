#[tokio::main]
async fn main() {
    if let Err(e) = presence_client::run_with_config().await {
        tracing::error!(error = %e, "client error");
    }
}
