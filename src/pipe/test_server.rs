//! Local axum server standing in for the hosted API in HTTP-level tests.

use axum::Router;
use tokio::net::TcpListener;

/// Serve the router built by `build` on an ephemeral port and return its base URL.
///
/// `build` receives the base URL so handlers can hand out links back to the
/// same server (signed upload URLs).
pub(crate) async fn serve(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test server");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let router = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    base
}
