use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use static_send::config::Config;
use static_send::logger;
use tokio::net::TcpListener;

mod server;

use server::AppState;

/// Config file used when none is given on the command line
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = Config::load_from(&config_path)?;

    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    // Worker thread count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, cfg.send.root.as_deref(), cfg.server.workers);

    let state = Arc::new(AppState::new(cfg));
    let connections = Arc::new(AtomicUsize::new(0));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local.run_until(serve(listener, state, connections)).await
}

async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    server::accept_connection(stream, peer_addr, &state, &connections);
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            _ = tokio::signal::ctrl_c() => {
                logger::log_warning("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}
