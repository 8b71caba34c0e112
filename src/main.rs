use std::sync::Arc;

use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;

use rolegate_backend::api::{AuthApi, HealthApi, PasswordApi, UserApi};
use rolegate_backend::app_data::AppData;
use rolegate_backend::config::{init_database, init_logging, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging()?;

    let config = AppConfig::from_env()?;
    let db = init_database(&config.database_url).await?;

    let listen_addr = config.listen_addr.clone();
    let data = Arc::new(AppData::init(config, db)?);

    let api_service = OpenApiService::new(
        (
            HealthApi,
            AuthApi::new(data.clone()),
            UserApi::new(data.clone()),
            PasswordApi::new(data.clone()),
        ),
        "Rolegate API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("http://{}/api", listen_addr));

    let ui = api_service.swagger_ui();

    let app = Route::new()
        .nest("/api", api_service)
        .nest("/swagger", ui);

    tracing::info!(addr = %listen_addr, "Starting server");
    Server::new(TcpListener::bind(listen_addr)).run(app).await?;

    Ok(())
}
