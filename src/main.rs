use std::sync::Arc;

use anyhow::Result;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use playlist_studio::{
    AppConfig, GeminiClient, Session,
    compositor::Compositor,
    credential::CredentialStore,
    storage::ExportStorage,
    web::{self, AppState},
};

const DOWNLOADS_PATH: &str = "/downloads";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playlist_studio=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let bind_address = config.bind_address();

    let credentials = Arc::new(CredentialStore::load(config.credential_path()));
    let client = GeminiClient::new(&config, credentials.clone())?;
    let font_dir = config.font_dir();
    let compositor = tokio::task::spawn_blocking(move || Compositor::new(Some(font_dir.as_path()))).await?;
    let export_dir = config.export_dir();
    let storage = ExportStorage::new(export_dir.clone(), DOWNLOADS_PATH);

    let session = Arc::new(Session::with_compositor(
        credentials,
        client,
        Arc::new(compositor),
        storage,
    ));
    session.launch().await;

    let router = web::router(AppState { session })
        .nest_service(DOWNLOADS_PATH, ServeDir::new(export_dir));
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!(
        text_model = %config.text_model,
        image_model = %config.image_model,
        data_dir = %config.data_dir.display(),
        "Playlist studio started at http://{bind_address}"
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
