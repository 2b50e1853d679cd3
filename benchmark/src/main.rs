use clap::Parser;
use hdrhistogram::Histogram;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of concurrent clients
    #[arg(short, long, default_value = "1")]
    concurrency: usize,

    /// INTERVAL ms
    #[arg(short, long, default_value = "100")]
    interval: u64,

    /// Duration of the benchmark in seconds
    #[arg(short, long, default_value = "30")]
    duration: u64,

    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:5555")]
    server: String,

    /// Instrument to trade
    #[arg(long, default_value = "BTCUSDT")]
    instrument: String,

    /// Mid price orders are scattered around
    #[arg(long, default_value = "50000")]
    mid: u64,
}

fn random_order(client: usize, seq: u64, instrument: &str, mid: u64) -> String {
    let mut rng = rand::thread_rng();
    let side = if rng.gen_bool(0.5) { "BUY" } else { "SELL" };
    let offset = mid / 1000;
    let price = rng.gen_range(mid - offset..=mid + offset);
    let quantity = rng.gen_range(1..=100);
    format!(
        "NEW_ORDER C{}-{} {} {} {} 0.{:03}\n",
        client, seq, instrument, side, price, quantity
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let histogram = Arc::new(Mutex::new(Histogram::<u64>::new(3)?));
    let total_requests = Arc::new(Mutex::new(0u64));

    println!(
        "Starting benchmark with {} concurrent clients, target INTERVAL: {}",
        args.concurrency, args.interval
    );

    // Spawn client tasks
    let mut handles = vec![];
    for client_id in 0..args.concurrency {
        let server_addr = args.server.clone();
        let instrument = args.instrument.clone();
        let mid = args.mid;
        let interval = args.interval;
        let histogram = histogram.clone();
        let total_requests = total_requests.clone();

        let handle = tokio::spawn(async move {
            let stream = match TcpStream::connect(&server_addr).await {
                Ok(stream) => stream,
                Err(e) => {
                    eprintln!("Failed to connect to server: {}", e);
                    return;
                }
            };
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            let mut reply = String::new();

            for seq in 0.. {
                let start = Instant::now();
                let request = random_order(client_id, seq, &instrument, mid);

                if let Err(e) = writer.write_all(request.as_bytes()).await {
                    eprintln!("Request failed: {}", e);
                    return;
                }
                reply.clear();
                match reader.read_line(&mut reply).await {
                    Ok(0) => {
                        eprintln!("Server closed the connection");
                        return;
                    }
                    Ok(_) if reply.trim_end() == "ORDER_ACCEPTED" => {
                        let duration = start.elapsed();
                        let mut hist = histogram.lock().await;
                        let _ = hist.record(duration.as_micros() as u64);
                        let mut total = total_requests.lock().await;
                        *total += 1;
                    }
                    Ok(_) => eprintln!("Request rejected: {}", reply.trim_end()),
                    Err(e) => {
                        eprintln!("Request failed: {}", e);
                        return;
                    }
                }

                sleep(Duration::from_millis(interval)).await;
            }
        });

        handles.push(handle);
    }

    // Run for specified duration
    sleep(Duration::from_secs(args.duration)).await;

    // Cancel all tasks
    for handle in handles {
        handle.abort();
    }

    // Print statistics
    let total = *total_requests.lock().await;
    let hist = histogram.lock().await;

    println!("\nBenchmark Results:");
    println!("Total Requests: {}", total);
    println!("Average TPS: {:.2}", total as f64 / args.duration as f64);
    println!("\nLatency Distribution (microseconds):");
    println!("p50: {}", hist.value_at_percentile(50.0));
    println!("p90: {}", hist.value_at_percentile(90.0));
    println!("p95: {}", hist.value_at_percentile(95.0));
    println!("p99: {}", hist.value_at_percentile(99.0));
    println!("p99.9: {}", hist.value_at_percentile(99.9));

    Ok(())
}
