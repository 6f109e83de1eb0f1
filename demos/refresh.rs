//! Example feeding a fragmented configuration stream through the router.
//!
//! This example shows how to:
//! - Start the core scheduler and a topology refresher
//! - Feed configuration bytes in arbitrary chunks
//! - Route document keys and watch a node leave the cluster
//! - Export routing and scheduler metrics in Prometheus format
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example refresh

use cluster_router::routing::LoggingEventListener;
use cluster_router::{ClientConfig, CoreScheduler, Router, TopologyRefresher};
use std::sync::Arc;
use std::time::{Duration, Instant};

const KEYS: [&str; 5] = ["foo", "bar", "baz", "user:123", "airline_10"];

fn document(revision: u64, hosts: &[&str]) -> String {
    let nodes: Vec<String> = hosts
        .iter()
        .map(|h| format!(r#"{{"hostname":"{}","ports":{{"direct":11210}}}}"#, h))
        .collect();
    format!(r#"{{"rev":{},"name":"travel-sample","nodes":[{}]}}"#, revision, nodes.join(","))
}

fn wait_for_revision(router: &Router, revision: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while router.revision() != Some(revision) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn print_routes(router: &Router) {
    for key in KEYS {
        match router.node_for_id(key.as_bytes()) {
            Ok(addr) => println!("  {:<12} -> {}", key, addr),
            Err(e) => println!("  {:<12} -> error: {}", key, e),
        }
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let config = ClientConfig::new();
    config.validate()?;

    let router = Arc::new(Router::with_listener(Arc::new(LoggingEventListener)));
    let scheduler = CoreScheduler::new(config.scheduler.clone());
    let refresher = TopologyRefresher::new(router.clone(), &scheduler, &config);

    println!("===========================================");
    println!("    Part 1: Three nodes, 7-byte chunks");
    println!("===========================================");
    println!();

    let first = document(1, &["192.168.56.101", "192.168.56.102", "192.168.56.103"]);
    for chunk in first.as_bytes().chunks(7) {
        refresher.feed(chunk.to_vec());
    }
    wait_for_revision(&router, 1);
    print_routes(&router);

    println!("===========================================");
    println!("    Part 2: 192.168.56.102 leaves");
    println!("===========================================");
    println!();

    let second = document(2, &["192.168.56.101", "192.168.56.103"]);
    refresher.feed(second.into_bytes());
    wait_for_revision(&router, 2);
    print_routes(&router);

    println!("===========================================");
    println!("    Metrics");
    println!("===========================================");
    println!();
    print!("{}", router.metrics().to_prometheus());
    print!("{}", scheduler.metrics().to_prometheus());

    scheduler.shutdown();
    scheduler.await_termination(Duration::from_secs(5));
    Ok(())
}
