//! Request-reply command server
//!
//! Each TCP connection is served by its own task: read one newline-terminated
//! request, answer with exactly one reply line, repeat. Connections share one
//! `MatchEngine`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

use crate::config::RuntimeConfig;
use crate::engine::MatchEngine;
use crate::error::EngineError;
use crate::metrics;
use crate::protocol::Reply;

pub struct Server {
    engine: Arc<MatchEngine>,
    config: RuntimeConfig,
    fatal_tx: Sender<EngineError>,
    fatal_rx: Receiver<EngineError>,
    accept_task: Option<JoinHandle<()>>,
}

impl Server {
    pub fn builder(engine: Arc<MatchEngine>, config: RuntimeConfig) -> Self {
        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        Server {
            engine,
            config,
            fatal_tx,
            fatal_rx,
            accept_task: None,
        }
    }

    /// Binds the command listener (and the metrics endpoint if enabled) and
    /// returns the bound command address.
    pub async fn start(&mut self) -> anyhow::Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.addr))?;
        let addr = listener.local_addr()?;

        if self.config.enable_metrics {
            let metrics_addr: SocketAddr = self
                .config
                .metrics_addr
                .parse()
                .with_context(|| format!("invalid metrics address {}", self.config.metrics_addr))?;
            metrics::spawn_server(metrics_addr)?;
        }

        let engine = self.engine.clone();
        let fatal_tx = self.fatal_tx.clone();
        let max_request_bytes = self.config.max_request_bytes;
        self.accept_task = Some(tokio::spawn(accept_loop(
            listener,
            engine,
            fatal_tx,
            max_request_bytes,
        )));
        log::info!("matching engine listening on {}", addr);
        Ok(addr)
    }

    /// Resolves once a connection hits an unrecoverable engine error.
    pub async fn wait_fatal(&mut self) -> EngineError {
        match self.fatal_rx.recv().await {
            Some(err) => err,
            None => EngineError::Internal("fatal error channel closed".to_string()),
        }
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
        log::info!("server stop");
    }
}

async fn accept_loop(
    listener: TcpListener,
    engine: Arc<MatchEngine>,
    fatal_tx: Sender<EngineError>,
    max_request_bytes: usize,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                log::warn!("accept failed: {}", e);
                continue;
            }
        };
        let engine = engine.clone();
        let fatal_tx = fatal_tx.clone();
        tokio::spawn(async move {
            log::debug!("connection from {}", peer);
            match serve_connection(engine, stream, max_request_bytes).await {
                Ok(()) => log::debug!("connection from {} closed", peer),
                Err(e) => match e.downcast::<EngineError>() {
                    Ok(err) if err.is_fatal() => {
                        log::error!("fatal error serving {}: {}", peer, err);
                        let _ = fatal_tx.send(err).await;
                    }
                    Ok(err) => log::warn!("connection from {} failed: {}", peer, err),
                    Err(e) => log::warn!("connection from {} failed: {:#}", peer, e),
                },
            }
        });
    }
}

async fn serve_connection(
    engine: Arc<MatchEngine>,
    stream: TcpStream,
    max_request_bytes: usize,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut request = Vec::with_capacity(256);

    loop {
        request.clear();
        let read = (&mut reader)
            .take(max_request_bytes as u64)
            .read_until(b'\n', &mut request)
            .await?;
        if read == 0 {
            return Ok(());
        }
        if request.last() != Some(&b'\n') && read >= max_request_bytes {
            discard_line(&mut reader).await?;
            let reply = format!("{}\n", Reply::Rejected("request too large".to_string()));
            writer.write_all(reply.as_bytes()).await?;
            continue;
        }

        let line = String::from_utf8_lossy(&request);
        let mut reply = engine.process_command(&line)?;
        reply.push('\n');
        writer.write_all(reply.as_bytes()).await?;
    }
}

/// Skips the rest of the current line without buffering it.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|b| *b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    }
}
