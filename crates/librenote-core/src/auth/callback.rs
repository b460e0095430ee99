//! Short-lived loopback HTTP listener receiving the OAuth redirect.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::{AuthError, AuthResult};

const SUCCESS_PAGE: &str = "<html><body style=\"font-family:sans-serif;display:flex;align-items:center;justify-content:center;height:100vh;margin:0\"><h2>Authenticated! You can close this window.</h2></body></html>";

type CallbackOutcome = Result<String, String>;

#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

impl CallbackState {
    fn deliver(&self, outcome: CallbackOutcome) {
        let sender = self
            .sender
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }
}

/// Listener bound for the duration of one authorization attempt.
///
/// The server stops accepting connections when the listener is dropped,
/// whether the flow succeeded, failed or timed out.
pub struct CallbackListener {
    addr: SocketAddr,
    receiver: oneshot::Receiver<CallbackOutcome>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl CallbackListener {
    pub async fn bind(addr: SocketAddr) -> AuthResult<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|error| {
            AuthError::Callback(format!("failed to listen on {addr}: {error}"))
        })?;
        let addr = listener
            .local_addr()
            .map_err(|error| AuthError::Callback(error.to_string()))?;

        let (code_tx, code_rx) = oneshot::channel();
        let state = CallbackState {
            sender: Arc::new(Mutex::new(Some(code_tx))),
        };
        let router = Router::new()
            .route("/", get(handle_redirect))
            .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(error) = server.await {
                tracing::warn!("OAuth callback listener failed: {}", error);
            }
        });
        tracing::debug!("OAuth callback listener bound on {}", addr);

        Ok(Self {
            addr,
            receiver: code_rx,
            shutdown: Some(shutdown_tx),
        })
    }

    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the browser redirect and return the authorization code.
    pub async fn wait_for_code(mut self, timeout: Duration) -> AuthResult<String> {
        let outcome = tokio::time::timeout(timeout, &mut self.receiver).await;
        self.close();
        match outcome {
            Err(_) => Err(AuthError::Timeout(timeout.as_secs())),
            Ok(Err(_)) => Err(AuthError::Callback(
                "listener stopped before a code arrived".to_string(),
            )),
            Ok(Ok(Err(message))) => Err(AuthError::Callback(message)),
            Ok(Ok(Ok(code))) => Ok(code),
        }
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.close();
    }
}

async fn handle_redirect(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    if let Some(code) = params.get("code").filter(|code| !code.is_empty()) {
        state.deliver(Ok(code.clone()));
        return (StatusCode::OK, Html(SUCCESS_PAGE.to_string()));
    }
    if let Some(error) = params.get("error") {
        state.deliver(Err(format!("authorization denied: {error}")));
        return (
            StatusCode::BAD_REQUEST,
            Html(format!("Authorization failed: {error}")),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Html("No code received".to_string()),
    )
}
