use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

pub const LIVENESS: &str = "Bot is running!";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { LIVENESS }))
}

/// Answer the hosting platform's health probes on `0.0.0.0:port` until the process exits.
pub async fn serve(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind the health endpoint to {addr}: {e}");
            return;
        }
    };

    log::info!("Health endpoint listening on http://{addr}");

    if let Err(e) = axum::serve(listener, router()).await {
        log::error!("Health endpoint died: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve as serve_locally;

    #[tokio::test]
    async fn says_its_alive() {
        let addr = serve_locally(router()).await;
        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), LIVENESS);
    }

    #[tokio::test]
    async fn nothing_else_is_there() {
        let addr = serve_locally(router()).await;
        let response = reqwest::get(format!("http://{addr}/admin")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
