use garage_clock::SystemClock;
use garage_runner::{CentralNode, init_logging, load_config, shutdown_on_ctrl_c};
use std::sync::Arc;

const USAGE: &str = r#"Garage Central - parking authority and billing server

USAGE:
    garage-central [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    CENTRAL_HOST        Bind host (default: 127.0.0.1)
    CENTRAL_PORT        Bind port (default: 8080)
    DB_PATH             Journal directory (default: in-memory store)
    PRECO_POR_MINUTO    Rate per started minute (default: 0.15)
    VALOR_MINIMO        Minimum fee (default: 2.00)
    RUST_LOG            Log level filter

EXAMPLES:
    # Run with defaults
    garage-central

    # Persist to ./journal on port 9000
    DB_PATH=./journal CENTRAL_PORT=9000 garage-central
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(config) = load_config(&args, USAGE)? else {
        return Ok(());
    };

    let shutdown = shutdown_on_ctrl_c();
    let CentralNode {
        handle,
        address,
        tasks,
    } = CentralNode::start(&config, Arc::new(SystemClock::new()), shutdown).await?;
    log::info!("Garage central listening on {}", address);

    // The actor exits once every handle is gone
    drop(handle);
    for task in tasks {
        task.await?;
    }

    log::info!("Garage central stopped");
    Ok(())
}
