use axum::{Router, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    api::{handlers, routes},
    config::Config,
    error::Result,
    generator::Generator,
    state::AppState,
    websocket::handler,
};

pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    /// WebSocket endpoint, HTTP API and JSON 404 fallback. Producers are not
    /// started here; see [`Server::serve`].
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/ws", get(handler::ws_handler))
            .merge(routes::configure_api_routes())
            .fallback(handlers::not_found)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.state.config.bind_addr()).await?;
        self.serve(listener).await
    }

    /// Serves on `listener` with the generator running until ctrl-c.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        let attack_mode = self.state.mode.is_enabled();
        info!(%addr, attack_mode, "CyberWatch server listening");

        let generator = Generator::spawn(self.state.clone());
        let app = Self::router(self.state.clone());

        let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        generator.shutdown();
        info!("Server stopped");
        Ok(served?)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
