use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("127.0.0.1:{port}");
    let app = match (std::env::var("FCREPO_USER"), std::env::var("FCREPO_PASSWORD")) {
        (Ok(user), Ok(password)) => mock_server::app_with_credentials(&user, &password),
        _ => mock_server::app(),
    };
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}{}", mock_server::ROOT);
    mock_server::serve(listener, app).await
}
