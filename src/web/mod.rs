pub mod handlers;
pub mod state;
pub mod templates;
pub mod util;

use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use axum::Router;
use axum::routing::any;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::frame::{FrameError, Result};

pub use state::AppState;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 80,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(handlers::index))
        .route("/index", any(handlers::index))
        .route("/next", any(handlers::next))
        .route("/prev", any(handlers::prev))
        .route("/list", any(handlers::list))
        .route("/show", any(handlers::show))
        .route("/fit", any(handlers::fit))
        .route("/fill", any(handlers::fill))
        .route("/status", any(handlers::status))
        .route("/shutdown", any(handlers::shutdown))
        .route("/reboot", any(handlers::reboot))
        .route("/images/:name", any(handlers::image))
        .route("/thumbnails/:name", any(handlers::thumbnail))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// The HTTP control surface, running on its own thread with its own tokio runtime.
pub struct ControlServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    thread: JoinHandle<std::io::Result<()>>,
}

impl ControlServer {
    /// Bind and start serving. Returns once the listener is bound, so a busy port fails here.
    /// `on_signal` runs when SIGINT/SIGTERM arrives.
    pub fn spawn<F>(config: &ServerConfig, state: AppState, on_signal: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("bind addr parse error: {e}"),
                )
            })?;

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let app = router(state);
        let (ready_tx, ready_rx) = mpsc::channel::<std::io::Result<SocketAddr>>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name("control-server".into())
            .spawn(move || rt.block_on(serve(addr, app, ready_tx, stop_rx, on_signal)))?;

        match ready_rx.recv() {
            Ok(Ok(addr)) => Ok(Self {
                addr,
                stop: stop_tx,
                thread,
            }),
            Ok(Err(source)) => {
                let _ = thread.join();
                Err(FrameError::Bind {
                    addr: addr.to_string(),
                    source,
                })
            }
            Err(_) => {
                let _ = thread.join();
                Err(FrameError::ServerStartup)
            }
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections, let in-flight requests finish, and join the thread.
    pub fn stop(self) -> Result<()> {
        let _ = self.stop.send(());
        self.thread.join().map_err(|_| FrameError::ServerPanicked)??;
        Ok(())
    }
}

async fn serve<F>(
    addr: SocketAddr,
    app: Router,
    ready_tx: mpsc::Sender<std::io::Result<SocketAddr>>,
    stop_rx: oneshot::Receiver<()>,
    on_signal: F,
) -> std::io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return Ok(());
        }
    };
    let local = listener.local_addr()?;
    let _ = ready_tx.send(Ok(local));
    info!(address = %format!("http://{local}"), "Listening");

    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Termination signal received");
        on_signal();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .await?;
    info!("Control server stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
