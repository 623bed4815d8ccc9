// Connection handling module
// Accepts TCP connections and serves them with the request handler

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use super::{handler, AppState};
use static_send::logger;

/// Accept a connection, enforcing the connection limit.
///
/// The counter is incremented before the limit check so that concurrent
/// accepts cannot both slip under the limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.connection.max_connections {
        if prev_count >= max_conn {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve one connection on the local task set.
///
/// Only the request head has a read deadline; body frames are bounded by the
/// sink's write stall limit, so a slow but live download runs to completion.
/// The connection counter is decremented when the task ends.
fn handle_connection(stream: TcpStream, state: Arc<AppState>, conn_counter: Arc<AtomicUsize>) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let limits = &state.config.connection;

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(limits.keep_alive)
            .header_read_timeout(limits.header_read_timeout());

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state))),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_send::config::{Config, ConnectionConfig, LoggingConfig, SendOptions, ServerConfig};
    use std::future::Future;
    use std::path::Path;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(root: &Path, max_connections: Option<usize>) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                workers: None,
            },
            logging: LoggingConfig {
                level: "warn".into(),
                access_log: false,
            },
            connection: ConnectionConfig {
                keep_alive: true,
                header_read_timeout: 1,
                write_stall_timeout: 1,
                max_connections,
            },
            send: SendOptions::with_root(root),
        }
    }

    /// Accept one connection and run `client` against it
    async fn with_server<F, Fut>(config: Config, client: F)
    where
        F: FnOnce(SocketAddr) -> Fut,
        Fut: Future<Output = ()>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(config));
        let connections = Arc::new(AtomicUsize::new(0));

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(async move {
                    let (stream, peer_addr) = listener.accept().await.unwrap();
                    accept_connection(stream, peer_addr, &state, &connections);
                });
                client(addr).await;
            })
            .await;
    }

    #[tokio::test]
    async fn test_slow_reader_receives_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![b'z'; 8 * 1024 * 1024];
        std::fs::write(dir.path().join("large.bin"), &content).unwrap();

        with_server(config(dir.path(), None), |addr| async move {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client
                .write_all(b"GET /large.bin HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();

            // reading takes several times longer than any configured limit
            let mut received = Vec::new();
            let mut buf = vec![0; 64 * 1024];
            loop {
                let n = client.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }

            assert!(received.starts_with(b"HTTP/1.1 200 OK"));
            let head_len = received
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .unwrap()
                + 4;
            assert_eq!(received.len() - head_len, content.len());
        })
        .await;
    }

    #[tokio::test]
    async fn test_incomplete_head_is_timed_out() {
        let dir = tempfile::tempdir().unwrap();

        with_server(config(dir.path(), None), |addr| async move {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

            let mut rest = Vec::new();
            let closed = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
                .await;
            assert!(closed.is_ok(), "connection still open after the head deadline");
        })
        .await;
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let dir = tempfile::tempdir().unwrap();

        with_server(config(dir.path(), Some(0)), |addr| async move {
            let mut client = TcpStream::connect(addr).await.unwrap();
            let _ = client
                .write_all(b"GET / HTTP/1.1\r\nhost: localhost\r\n\r\n")
                .await;

            let mut rest = Vec::new();
            let _ = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
                .await
                .unwrap();
            assert!(rest.is_empty());
        })
        .await;
    }
}
