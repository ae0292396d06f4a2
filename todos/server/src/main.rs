use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todos_server=debug,tower_http=info,info")),
        )
        .init();
    let config = todos_server::config::Config::from_env()?;
    todos_server::web::start_web_server(config).await
}
