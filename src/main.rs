use dotenvy::dotenv;
use tracing::info;

use life_lessons_api::infra::{
    InfraError,
    app::create_app,
    setup::{init_app_state, init_tracing},
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(InfraError::TcpBind)?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(InfraError::Server)?;

    Ok(())
}
