use garage_clock::SystemClock;
use garage_gateway::TcpRequester;
use garage_runner::{GroundFloor, init_logging, load_config, shutdown_on_ctrl_c};
use std::sync::Arc;

const USAGE: &str = r#"Garage Ground Floor - entry and exit lane controllers

USAGE:
    garage-ground-floor [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    CENTRAL_HOST        Central server host (default: 127.0.0.1)
    CENTRAL_PORT        Central server port (default: 8080)
    LPR_CONFIDENCE_MIN  Minimum plate confidence (default: 0.8)
    TOTAL_VAGAS         Number of slots (default: 8)
    MODE                simulation | hardware (default: simulation)
    RUST_LOG            Log level filter

EXAMPLES:
    # Simulated devices against a local central
    garage-ground-floor

    # Register-mapped devices, remote central
    MODE=hardware CENTRAL_HOST=10.0.0.2 garage-ground-floor
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(config) = load_config(&args, USAGE)? else {
        return Ok(());
    };

    let central = Arc::new(TcpRequester::new(config.client_config()));
    log::info!("Lanes report to {}", central.config().address());

    let floor = GroundFloor::build(&config, central, Arc::new(SystemClock::new())).await?;
    let running = floor.spawn(config.stats_interval(), shutdown_on_ctrl_c());

    for task in running.tasks {
        task.await?;
    }

    log::info!("Ground floor stopped");
    Ok(())
}
