//! Metrics collection module for the match service
//!
//! This module provides functionality for collecting and exposing service metrics
//! using Prometheus.

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::net::SocketAddr;
use std::time::Instant;

lazy_static! {
    /// Global Prometheus registry instance
    pub static ref REGISTRY_INSTANCE: Registry = Registry::new();

    /// Counter for tracking request counts by method
    pub static ref REQ_COUNTER_VEC: CounterVec =
        CounterVec::new(Opts::new("request_counter", "request counter"), &["method"])
            .expect("valid request_counter definition");

    /// Histogram for tracking method execution times
    pub static ref METHOD_HISTOGRAM_VEC: HistogramVec = HistogramVec::new(
        HistogramOpts::new("method_cost", "method cost"),
        &["method"]
    )
    .expect("valid method_cost definition");

    /// Trades emitted across all instruments
    pub static ref TRADE_COUNTER: IntCounter =
        IntCounter::new("trade_counter", "trades executed")
            .expect("valid trade_counter definition");

    /// Order books created since start
    pub static ref ORDER_BOOK_COUNTER: IntCounter =
        IntCounter::new("order_book_counter", "order books created")
            .expect("valid order_book_counter definition");
}

/// Initializes the metrics registry
///
/// Registers all metric collectors with the global registry
pub fn init_registry() {
    let _ = REGISTRY_INSTANCE.register(Box::new(REQ_COUNTER_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(METHOD_HISTOGRAM_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(TRADE_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(ORDER_BOOK_COUNTER.clone()));
}

/// Counts a call to `method_name` and records how long `handler` took.
pub fn record_metrics<F, T>(method_name: &'static str, handler: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    REQ_COUNTER_VEC.with_label_values(&[method_name]).inc();
    let result = handler();

    let elapsed = start.elapsed();
    METHOD_HISTOGRAM_VEC
        .with_label_values(&[method_name])
        .observe(elapsed.as_secs_f64());

    result
}

/// Text exposition of every registered metric.
pub fn gather() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY_INSTANCE.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        log::warn!("failed to encode metrics: {}", e);
    }
    buffer
}

/// Serves `gather()` over HTTP on `addr` from a background task.
pub fn spawn_server(addr: SocketAddr) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(|_| async {
        Ok::<_, hyper::Error>(service_fn(|_: Request<Body>| async {
            Ok::<_, hyper::Error>(Response::new(Body::from(gather())))
        }))
    });
    init_registry();
    let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
    tokio::spawn(async move {
        if let Err(e) = server.await {
            log::error!("metrics server error: {}", e);
        }
    });
    log::info!("metrics server started on {}", addr);
    Ok(())
}
