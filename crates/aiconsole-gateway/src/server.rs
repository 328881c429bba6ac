use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::SharedState;

/// HTTP front door for the console. Owns the shared state and serves the
/// router until the process is stopped.
pub struct GatewayServer {
    state: SharedState,
}

impl GatewayServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub async fn run(self) -> std::io::Result<()> {
        let addr = format!(
            "{}:{}",
            self.state.config.gateway.host, self.state.config.gateway.port
        );
        let listener = TcpListener::bind(&addr).await?;
        info!("console gateway listening on {addr}");
        axum::serve(listener, build_router(self.state)).await
    }
}
