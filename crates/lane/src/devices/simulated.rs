//! Simulated lane devices
//!
//! Randomness comes from a seedable `StdRng`, so a run can be replayed.

use async_trait::async_trait;
use garage_ports::{
    DeviceLink, DisplayPanel, GateDriver, HardwareResult, PlateCapture, PlateReading,
    PresenceSensor,
};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

/// Plates the simulated camera reads
pub const CATALOGUE: [&str; 10] = [
    "ABC1234", "DEF5678", "GHI9012", "JKL3456", "MNO7890", "PQR1234", "STU5678", "VWX9012",
    "YZA3456", "BCD7890",
];

fn rng_from(seed: Option<u64>) -> Mutex<StdRng> {
    Mutex::new(match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    })
}

fn lock(rng: &Mutex<StdRng>) -> MutexGuard<'_, StdRng> {
    rng.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Presence sensor that fires with a fixed probability per poll
pub struct SimulatedPresenceSensor {
    probability: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedPresenceSensor {
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_probability(0.3, seed)
    }

    pub fn with_probability(probability: f64, seed: Option<u64>) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng: rng_from(seed),
        }
    }
}

#[async_trait]
impl PresenceSensor for SimulatedPresenceSensor {
    async fn detect(&self) -> HardwareResult<bool> {
        Ok(lock(&self.rng).gen_bool(self.probability))
    }
}

/// Camera that picks plates from [`CATALOGUE`]
///
/// 90 % of captures succeed, with confidence drawn from `[0.70, 0.98)`,
/// after a processing delay of one to three seconds.
pub struct SimulatedPlateCapture {
    success_rate: f64,
    confidence: Range<f64>,
    delay_ms: Range<u64>,
    rng: Mutex<StdRng>,
}

impl SimulatedPlateCapture {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            success_rate: 0.9,
            confidence: 0.70..0.98,
            delay_ms: 1000..3000,
            rng: rng_from(seed),
        }
    }

    /// Replace the processing delay range
    pub fn with_delay(mut self, delay: Range<Duration>) -> Self {
        let start = delay.start.as_millis() as u64;
        let end = (delay.end.as_millis() as u64).max(start + 1);
        self.delay_ms = start..end;
        self
    }
}

#[async_trait]
impl PlateCapture for SimulatedPlateCapture {
    async fn capture(&self) -> HardwareResult<Option<PlateReading>> {
        let (delay, reading) = {
            let mut rng = lock(&self.rng);
            let delay = Duration::from_millis(rng.gen_range(self.delay_ms.clone()));
            let reading = if rng.gen_bool(self.success_rate) {
                let plate = CATALOGUE.choose(&mut *rng).copied().unwrap_or(CATALOGUE[0]);
                Some(PlateReading::new(plate, rng.gen_range(self.confidence.clone())))
            } else {
                None
            };
            (delay, reading)
        };

        sleep(delay).await;
        match &reading {
            Some(r) => info!("Simulated capture: {} ({:.2})", r.plate, r.confidence),
            None => info!("Simulated capture failed"),
        }
        Ok(reading)
    }
}

/// Gate with fixed travel time and a vehicle that passes after a delay
pub struct SimulatedGate {
    travel: Duration,
    passage_after: Duration,
    open: AtomicBool,
    cycles: AtomicUsize,
}

impl SimulatedGate {
    pub fn new() -> Self {
        Self::with_timing(Duration::from_secs(2), Duration::from_secs(3))
    }

    pub fn with_timing(travel: Duration, passage_after: Duration) -> Self {
        Self {
            travel,
            passage_after,
            open: AtomicBool::new(false),
            cycles: AtomicUsize::new(0),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Completed open/close cycles
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GateDriver for SimulatedGate {
    async fn open(&self) -> HardwareResult<()> {
        sleep(self.travel).await;
        self.open.store(true, Ordering::SeqCst);
        info!("Simulated gate open");
        Ok(())
    }

    async fn close(&self) -> HardwareResult<()> {
        sleep(self.travel).await;
        if self.open.swap(false, Ordering::SeqCst) {
            self.cycles.fetch_add(1, Ordering::SeqCst);
        }
        info!("Simulated gate closed");
        Ok(())
    }

    async fn sense_passage(&self, timeout: Duration) -> HardwareResult<bool> {
        if !self.is_open() {
            return Ok(false);
        }
        if self.passage_after <= timeout {
            sleep(self.passage_after).await;
            Ok(true)
        } else {
            sleep(timeout).await;
            Ok(false)
        }
    }
}

/// Display that writes occupancy to the log
#[derive(Debug, Default)]
pub struct LogDisplay;

#[async_trait]
impl DisplayPanel for LogDisplay {
    async fn show(&self, free: usize, total: usize) -> HardwareResult<()> {
        info!("Display: {}/{} slots free", free, total);
        Ok(())
    }
}

/// Link that is always available
pub struct SimulatedLink {
    name: String,
    connected: AtomicBool,
}

impl SimulatedLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DeviceLink for SimulatedLink {
    async fn connect(&self) -> HardwareResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_core::Plate;

    #[tokio::test(start_paused = true)]
    async fn test_seeded_capture_is_reproducible() {
        let first = SimulatedPlateCapture::new(Some(7));
        let second = SimulatedPlateCapture::new(Some(7));

        for _ in 0..20 {
            assert_eq!(first.capture().await.unwrap(), second.capture().await.unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_captures_are_catalogue_plates_in_range() {
        let camera = SimulatedPlateCapture::new(Some(42));
        let mut successes = 0;

        for _ in 0..200 {
            if let Some(reading) = camera.capture().await.unwrap() {
                successes += 1;
                assert!(CATALOGUE.contains(&reading.plate.as_str()));
                assert!(Plate::parse(&reading.plate).is_ok());
                assert!((0.70..0.98).contains(&reading.confidence));
            }
        }
        assert!(successes > 150);
    }

    #[tokio::test]
    async fn test_presence_extremes() {
        let never = SimulatedPresenceSensor::with_probability(0.0, Some(1));
        let always = SimulatedPresenceSensor::with_probability(1.0, Some(1));
        for _ in 0..10 {
            assert!(!never.detect().await.unwrap());
            assert!(always.detect().await.unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_cycle_and_passage_timeout() {
        let gate = SimulatedGate::with_timing(Duration::from_secs(2), Duration::from_secs(3));
        assert!(!gate.sense_passage(Duration::from_secs(10)).await.unwrap());

        gate.open().await.unwrap();
        assert!(gate.is_open());
        assert!(gate.sense_passage(Duration::from_secs(10)).await.unwrap());
        assert!(!gate.sense_passage(Duration::from_secs(1)).await.unwrap());

        gate.close().await.unwrap();
        assert!(!gate.is_open());
        assert_eq!(gate.cycles(), 1);
    }
}
