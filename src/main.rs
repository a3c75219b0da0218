use clap::Parser;
use rpc_http_gateway::demo::register_demo_services;
use rpc_http_gateway::server;
use rpc_http_gateway::{GatewayConfig, HttpTransport, Metrics, ServiceRegistry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    server::metrics::init_logging();

    let config = GatewayConfig::parse();

    // Create components
    let metrics = Arc::new(Metrics::new());
    let registry =
        ServiceRegistry::with_options(config.registry_options()).with_metrics(metrics.clone());

    // A registration error leaves the registry ambiguous, so refuse to start
    register_demo_services(&registry).await?;
    let services = registry.service_names().await;

    // Spawn metrics reporter
    let reporter = config
        .metrics_interval()
        .map(|every| tokio::spawn(server::metrics::report_periodically(metrics.clone(), every)));

    server::metrics::log_startup(&config.addr, &services);
    println!();
    println!("Example request:");
    println!(r#"curl -X POST http://{}/Echo/Say \"#, config.addr);
    println!(r#"  -H "Content-Type: application/json" \"#);
    println!(r#"  -d '{{"msg":"hi"}}'"#);
    println!();

    // Run server until SIGINT / SIGTERM
    HttpTransport::new(registry).serve(&config.addr).await?;

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    let final_metrics = metrics.snapshot().await;
    tracing::info!("Final metrics: {:?}", final_metrics);

    server::metrics::log_shutdown();
    Ok(())
}
