use livecursors::config::RelayConfig;
use livecursors::relay;
use livecursors::transport::Hub;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = RelayConfig::from_env();
    let hub = Hub::new(config.client_buffer);
    let app = relay::app(hub);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, client_buffer = config.client_buffer, "livecursors relay listening");
    axum::serve(listener, app).await.expect("server failed");
}
