//! HTTP server, session sweeping, and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`, so no new connections are made.
//! 2. Letting every in-flight connection task run to completion.
//! 3. Stopping the session sweeper.
//! 4. Returning from [`Server::serve`], which lets `main` exit cleanly.
//!
//! # One request, one blocking task
//!
//! Controllers, hooks, and handlers are plain synchronous code: they lock
//! sessions, read files, and render templates. Each request therefore runs on
//! tokio's blocking pool via `spawn_blocking`, keeping the async workers free
//! to accept and drive connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::result::{self, ActionResult, BufferedResponse};
use crate::router::Router;
use crate::session_store::SessionStore;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use mvcapp::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Read-only from here on; shared by every connection task.
        let router = Arc::new(router);

        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = match (router.session_store(), router.settings().sweep_interval()) {
            (Some(store), Some(every)) => {
                Some(tokio::spawn(sweep_sessions(Arc::clone(store), every, stop_rx)))
            }
            _ => None,
        };

        info!(addr = %self.addr, "mvcapp listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting new
                // connections even if more are queued.
                biased;

                () = &mut shutdown => {
                    info!(
                        in_flight = tasks.len(),
                        "shutdown signal received, draining connections"
                    );
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        let _ = stop_tx.send(true);
        if let Some(sweeper) = sweeper {
            let _ = sweeper.await;
        }

        info!("mvcapp stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Turns one hyper request into one response.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// is answered with a status code, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let Ok(method) = Method::try_from(req.method()) else {
        debug!(method = %req.method(), "rejecting unknown method");
        return Ok(status_only(Status::MethodNotAllowed));
    };

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read request body: {e}");
            return Ok(status_only(Status::BadRequest));
        }
    };

    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            Some((name.as_str().to_owned(), value.to_str().ok()?.to_owned()))
        })
        .collect();
    let request = Request::from_parts(method, &target, headers, body);

    let response = tokio::task::spawn_blocking(move || router.dispatch(request))
        .await
        .unwrap_or_else(|e| {
            error!("request task failed: {e}");
            let mut sink = BufferedResponse::new();
            let page = result::error_page("request handler failed");
            if let Err(e) = page.execute(&mut sink) {
                error!("failed to write response: {e}");
            }
            sink
        });

    Ok(response.into_http())
}

fn status_only(status: Status) -> http::Response<Full<Bytes>> {
    let mut sink = BufferedResponse::new();
    // A fresh sink is never committed, so this cannot fail.
    let _ = ActionResult::status(status).execute(&mut sink);
    sink.into_http()
}

// ── Session sweeping ──────────────────────────────────────────────────────────

/// Sweeps expired sessions every `every` until `stop` flips to `true`.
async fn sweep_sessions(
    store: Arc<SessionStore>,
    every: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; skip it.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let store = Arc::clone(&store);
                match tokio::task::spawn_blocking(move || store.sweep()).await {
                    Ok(removed) => debug!(removed, "session sweep finished"),
                    Err(e) => error!("session sweep failed: {e}"),
                }
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_responses_have_no_body() {
        let res = status_only(Status::MethodNotAllowed);
        assert_eq!(res.status(), http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweeper_expires_sessions_until_stopped() {
        // A zero timeout makes every unlocked session idle once the clock moves.
        let store = Arc::new(SessionStore::new(Duration::ZERO));
        store.get_or_create("EIMA5VQOU4980S35AYPAEKYABL73GZBA");

        let (stop_tx, stop_rx) = watch::channel(false);
        let every = Duration::from_millis(10);
        let task = tokio::spawn(sweep_sessions(Arc::clone(&store), every, stop_rx));

        for _ in 0..200 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(store.is_empty());

        stop_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
