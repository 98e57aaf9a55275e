//! Loopback HTTP listener that receives the OAuth redirect.
//!
//! The listener runs on its own thread with a single-worker actix runtime
//! for the duration of one authentication attempt. The captured code is
//! handed to the waiting task through a one-shot channel.

use crate::errors::AuthError;
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const AUTHORIZATION_COMPLETE_PAGE: &str = "Authorization Complete. You may close this window.";

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

struct CallbackState {
    expected_state: String,
    code_tx: Mutex<Option<oneshot::Sender<String>>>,
    shutdown_tx: mpsc::UnboundedSender<()>,
}

async fn capture_code(
    data: web::Data<CallbackState>,
    params: web::Query<CallbackParams>,
) -> HttpResponse {
    if let Some(ref error) = params.error {
        tracing::warn!("Authorization was denied by the provider: {}", error);
        return HttpResponse::BadRequest().body(format!("Authorization failed: {}", error));
    }

    if params.state.as_deref() != Some(data.expected_state.as_str()) {
        tracing::warn!("Ignoring callback with mismatched state parameter");
        return HttpResponse::BadRequest().body("Authorization failed: state mismatch");
    }

    let Some(code) = params.code.clone().filter(|c| !c.is_empty()) else {
        return HttpResponse::BadRequest().body("Authorization failed: missing code");
    };

    let sender = match data.code_tx.lock() {
        Ok(mut slot) => slot.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };

    match sender {
        Some(tx) => {
            if tx.send(code).is_err() {
                tracing::warn!("Auth code arrived after the wait was abandoned");
            } else {
                tracing::info!("Auth code captured by callback listener");
            }
        }
        None => tracing::debug!("Auth code already captured, ignoring repeat callback"),
    }

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(AUTHORIZATION_COMPLETE_PAGE)
}

async fn shutdown(data: web::Data<CallbackState>) -> HttpResponse {
    tracing::info!("Shutting down callback listener...");
    let _ = data.shutdown_tx.send(());
    HttpResponse::Ok().body("Server shutting down...")
}

/// A running callback listener
pub struct CallbackListener {
    local_addr: SocketAddr,
    handle: ServerHandle,
    code_rx: oneshot::Receiver<String>,
    thread: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Binds `bind_addr` and starts serving on a background thread.
    ///
    /// Only callbacks whose `state` equals `expected_state` are accepted.
    pub async fn start(bind_addr: SocketAddr, expected_state: &str) -> Result<Self, AuthError> {
        let (code_tx, code_rx) = oneshot::channel();
        let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let data = web::Data::new(CallbackState {
            expected_state: expected_state.to_string(),
            code_tx: Mutex::new(Some(code_tx)),
            shutdown_tx,
        });

        let thread = std::thread::Builder::new()
            .name("oauth-callback".to_string())
            .spawn(move || {
                actix_web::rt::System::new().block_on(async move {
                    let server = HttpServer::new(move || {
                        App::new()
                            .app_data(data.clone())
                            .route("/", web::get().to(capture_code))
                            .route("/shutdown", web::post().to(shutdown))
                    })
                    .workers(1)
                    .disable_signals()
                    .shutdown_timeout(1)
                    .bind(bind_addr);

                    let server = match server {
                        Ok(server) => server,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };

                    let local_addr = server.addrs().first().copied().unwrap_or(bind_addr);
                    let server = server.run();
                    let handle = server.handle();
                    let _ = ready_tx.send(Ok((local_addr, handle.clone())));

                    actix_web::rt::spawn(async move {
                        if shutdown_rx.recv().await.is_some() {
                            handle.stop(true).await;
                        }
                    });

                    if let Err(e) = server.await {
                        tracing::error!("Callback listener stopped with error: {}", e);
                    }
                });
            })
            .map_err(|e| AuthError::ListenerError { source: e })?;

        let (local_addr, handle) = match ready_rx.await {
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(AuthError::ListenerError { source: e });
            }
            Err(_) => {
                let _ = thread.join();
                return Err(AuthError::Generic {
                    reason: "Callback listener thread exited before binding".to_string(),
                });
            }
        };

        tracing::info!("Callback listener running on http://{}", local_addr);

        Ok(Self {
            local_addr,
            handle,
            code_rx,
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Polls for the captured code, `attempts` times at `interval`.
    ///
    /// Returns `None` when the budget is spent without a callback.
    pub async fn wait_for_code(&mut self, attempts: u32, interval: Duration) -> Option<String> {
        for attempt in 1..=attempts {
            match tokio::time::timeout(interval, &mut self.code_rx).await {
                Ok(Ok(code)) => return Some(code),
                Ok(Err(_)) => {
                    tracing::error!("Callback listener dropped the code channel");
                    return None;
                }
                Err(_) => {
                    tracing::info!("Waiting for auth code... ({}/{})", attempt, attempts);
                }
            }
        }
        None
    }

    /// Requests `POST /shutdown` and waits for the listener thread to exit
    pub async fn shutdown(mut self) {
        let url = format!("http://{}/shutdown", self.local_addr);
        match reqwest::Client::new().post(&url).send().await {
            Ok(response) => tracing::debug!("Shutdown request returned {}", response.status()),
            Err(e) => {
                tracing::warn!("Shutdown request failed ({}), stopping listener directly", e);
                self.handle.stop(false).await;
            }
        }

        if let Some(thread) = self.thread.take() {
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => tracing::debug!("Callback listener thread joined"),
                Ok(Err(_)) => tracing::error!("Callback listener thread panicked"),
                Err(e) => tracing::error!("Failed to join callback listener thread: {}", e),
            }
        }
    }
}
