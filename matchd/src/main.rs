use std::sync::Arc;

use clap::Parser;
use tokio::signal;

use matchd::config::{self, RuntimeConfig};
use matchd::server::Server;
use matchd::{LogSink, MatchEngine};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the TOML runtime config
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Command listener address, overrides the config file
    #[arg(short, long)]
    addr: Option<String>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::try_init().unwrap_or_default();
    let args = Args::parse();

    let mut runtime_config = RuntimeConfig::from_toml(&args.config);
    if let Some(addr) = args.addr {
        runtime_config.addr = addr;
    }
    config::init(runtime_config);

    let engine = Arc::new(MatchEngine::new(Arc::new(LogSink)));
    let mut server = Server::builder(engine, config::instance().clone());
    if let Err(e) = server.start().await {
        log::error!("Fatal error: {:#}", e);
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal() => {
            server.stop();
            Ok(())
        }
        fatal = server.wait_fatal() => {
            log::error!("Fatal error: {}", fatal);
            server.stop();
            Err(fatal.into())
        }
    }
}
