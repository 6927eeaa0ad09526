use crate::proxy::handler::{handle_request, AppState};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

// Pause after a failed accept (e.g. EMFILE) so the loop does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct ProxyServer {
    listener: TcpListener,
    state: Arc<AppState>,
    semaphore: Arc<Semaphore>,
}

impl ProxyServer {
    pub async fn bind(
        addr: SocketAddr,
        state: AppState,
        max_connections: NonZeroUsize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;

        Ok(Self {
            listener,
            state: Arc::new(state),
            semaphore: Arc::new(Semaphore::new(max_connections.get())),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until `shutdown` resolves. Each connection holds a
    /// permit, so at most `max_connections` are served at once.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        info!(
            addr = %self.local_addr()?,
            max_connections = self.semaphore.available_permits(),
            "relay server listening"
        );
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = self.semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let listener = &self.listener;
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                conn = accept_with_backoff(move || listener.accept()) => conn,
            };

            let state = self.state.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let service = service_fn(move |req| handle_request(req, state.clone()));
                if let Err(err) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!(%peer, error = %err, "connection closed with error");
                }
            });
        }

        info!("relay server shutting down");
        Ok(())
    }
}

/// Retries `accept` until it yields a connection, sleeping between failures.
async fn accept_with_backoff<T, F, Fut>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(conn) => return conn,
            Err(err) => {
                warn!(error = %err, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Resolves once `signal` fires. A signal that cannot be registered is logged
/// and never resolves, so the server keeps running instead of exiting.
pub async fn shutdown_on(signal: impl Future<Output = io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
