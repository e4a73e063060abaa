//! End-to-end garage tests
//!
//! A real central node on an ephemeral port, reached over TCP by raw JSON
//! lines and by a full ground floor running register-mapped devices on
//! in-memory buses.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use garage_clock::ManualClock;
use garage_core::{Event, GateAction};
use garage_gateway::{ClientConfig, Requester, TcpRequester};
use garage_lane::LaneStatus;
use garage_lane::devices::{LogDisplay, MemoryBus};
use garage_runner::bootstrap::{
    GATE_COILS, PLATE_REGISTER_BASE, PRESENCE_COIL, hardware_devices,
};
use garage_runner::{CentralNode, GarageConfig, GroundFloor};
use rust_decimal_macros::dec;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

fn test_config() -> GarageConfig {
    let mut config = GarageConfig::default();
    config.central.port = 0;
    config.lanes.poll_interval_ms = 20;
    config.lanes.error_backoff_ms = 100;
    config.lanes.passage_timeout_ms = 2_000;
    config.lanes.request_timeout_ms = 2_000;
    config
}

fn clock() -> Arc<ManualClock> {
    ManualClock::starting_at(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap())
}

async fn start_central(
    config: &GarageConfig,
    clock: Arc<ManualClock>,
) -> (CentralNode, watch::Sender<bool>) {
    let _ = env_logger::try_init();
    let (tx, rx) = watch::channel(false);
    let node = CentralNode::start(config, clock, rx).await.unwrap();
    (node, tx)
}

async fn send_line(address: std::net::SocketAddr, line: &str) -> Value {
    let stream = TcpStream::connect(address).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.write_all(b"\n").await.unwrap();
    writer.flush().await.unwrap();

    let mut reply = String::new();
    BufReader::new(reader).read_line(&mut reply).await.unwrap();
    serde_json::from_str(reply.trim()).unwrap()
}

/// Play one vehicle at a lane: present a plate, cross once the barrier opens
async fn drive_through(bus: Arc<MemoryBus>, plate: &str) {
    let coils = GATE_COILS;
    bus.load_plate(PLATE_REGISTER_BASE, plate, 0.95);
    bus.set_coil(PRESENCE_COIL, true);

    while !bus.coil(coils.open) {
        sleep(Duration::from_millis(5)).await;
    }
    bus.set_coil(PRESENCE_COIL, false);
    bus.set_coil(coils.passage, true);
}

async fn wait_for<F>(status: &mut watch::Receiver<LaneStatus>, condition: F) -> LaneStatus
where
    F: FnMut(&LaneStatus) -> bool,
{
    timeout(Duration::from_secs(10), status.wait_for(condition))
        .await
        .expect("lane did not reach the expected status")
        .unwrap()
        .clone()
}

#[tokio::test]
async fn test_wire_entry_then_exit_thirty_minutes_later() {
    let config = test_config();
    let (node, shutdown) = start_central(&config, clock()).await;

    let entry = send_line(
        node.address,
        r#"{"placa":"ABC1234","tipo":"entrada","timestamp":"2024-03-15T10:00:00","confianca_lpr":0.95}"#,
    )
    .await;
    assert_eq!(entry["sucesso"], true);
    assert_eq!(entry["acao"], "abrir_cancela");
    assert!(entry["valor"].is_null());

    let exit = send_line(
        node.address,
        r#"{"placa":"ABC1234","tipo":"saida","timestamp":"2024-03-15T10:30:00Z","confianca_lpr":0.91}"#,
    )
    .await;
    assert_eq!(exit["sucesso"], true);
    assert_eq!(exit["acao"], "cobrar_valor");
    assert_eq!(exit["tempo_permanencia"], 30);
    assert_eq!(exit["valor"].as_f64().unwrap(), 4.5);
    assert_eq!(exit["mensagem"], "Valor a pagar: R$ 4.50");

    let again = send_line(
        node.address,
        r#"{"placa":"ABC1234","tipo":"saida","timestamp":"2024-03-15T10:31:00Z","confianca_lpr":0.91}"#,
    )
    .await;
    assert_eq!(again["sucesso"], false);
    assert_eq!(again["acao"], "negar_saida");

    shutdown.send(true).unwrap();
}

#[tokio::test]
async fn test_tcp_requester_against_central_node() {
    let config = test_config();
    let (node, shutdown) = start_central(&config, clock()).await;
    let client = TcpRequester::new(
        ClientConfig::new("127.0.0.1", node.address.port()).with_timeout(Duration::from_secs(2)),
    );
    let t0 = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();

    let entered = client.request(&Event::entry("DEF5678", t0, 0.9)).await.unwrap();
    assert_eq!(entered.action, GateAction::OpenGate);

    let duplicate = client.request(&Event::entry("DEF5678", t0, 0.9)).await.unwrap();
    assert!(!duplicate.success);
    assert_eq!(duplicate.action, GateAction::DenyEntry);

    let exit_time = t0 + ChronoDuration::minutes(10);
    let charged = client.request(&Event::exit("DEF5678", exit_time, 0.9)).await.unwrap();
    assert_eq!(charged.action, GateAction::Charge);
    assert_eq!(charged.duration_minutes, Some(10));
    assert_eq!(charged.fee, Some(dec!(2.00)));

    shutdown.send(true).unwrap();
}

#[tokio::test]
async fn test_ground_floor_full_visit() {
    let config = test_config();
    let clock = clock();
    let (node, shutdown) = start_central(&config, Arc::clone(&clock)).await;

    let mut lane_config = config.clone();
    lane_config.central.port = node.address.port();
    lane_config.lanes.total_slots = 4;
    let central = Arc::new(TcpRequester::new(lane_config.client_config()));

    let entry_bus = Arc::new(MemoryBus::new("entry-bus"));
    let exit_bus = Arc::new(MemoryBus::new("exit-bus"));
    let floor = GroundFloor::with_devices(
        &lane_config,
        central,
        clock.clone(),
        hardware_devices(Arc::clone(&entry_bus)),
        hardware_devices(Arc::clone(&exit_bus)),
        Arc::new(LogDisplay),
    );
    let mut running = floor.spawn(Duration::from_secs(60), shutdown.subscribe());

    drive_through(Arc::clone(&entry_bus), "ABC1234").await;
    let entry = wait_for(&mut running.entry_status, |s| s.cycles == 1).await;
    assert_eq!(entry.denials, 0);
    assert_eq!(running.slots.stats().occupied, 1);

    let parked = node.handle.parked_vehicles().await.unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].plate, "ABC1234");
    assert_eq!(parked[0].slot, Some(0));

    clock.advance(ChronoDuration::minutes(30));
    drive_through(Arc::clone(&exit_bus), "ABC1234").await;
    wait_for(&mut running.exit_status, |s| s.cycles == 1).await;
    assert_eq!(running.slots.stats().occupied, 0);

    let stats = node.handle.stats().await.unwrap();
    assert_eq!(stats.parked, 0);
    assert_eq!(stats.today.entries, 1);
    assert_eq!(stats.today.exits, 1);
    assert_eq!(stats.today.revenue, dec!(4.50));

    shutdown.send(true).unwrap();
    for task in running.tasks {
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }
    assert!(!entry_bus.coil(GATE_COILS.open));
}

#[tokio::test]
async fn test_ground_floor_denies_unknown_exit() {
    let config = test_config();
    let clock = clock();
    let (node, shutdown) = start_central(&config, Arc::clone(&clock)).await;

    let mut lane_config = config.clone();
    lane_config.central.port = node.address.port();
    let central = Arc::new(TcpRequester::new(lane_config.client_config()));

    let exit_bus = Arc::new(MemoryBus::new("exit-bus"));
    let floor = GroundFloor::with_devices(
        &lane_config,
        central,
        clock,
        hardware_devices(Arc::new(MemoryBus::new("entry-bus"))),
        hardware_devices(Arc::clone(&exit_bus)),
        Arc::new(LogDisplay),
    );
    let mut running = floor.spawn(Duration::from_secs(60), shutdown.subscribe());

    exit_bus.load_plate(PLATE_REGISTER_BASE, "XYZ9876", 0.95);
    exit_bus.set_coil(PRESENCE_COIL, true);
    let status = wait_for(&mut running.exit_status, |s| s.denials >= 1).await;
    exit_bus.set_coil(PRESENCE_COIL, false);

    assert_eq!(status.cycles, 0);
    assert!(!exit_bus.coil(GATE_COILS.open));
    assert_eq!(running.slots.stats().occupied, 0);

    shutdown.send(true).unwrap();
}
