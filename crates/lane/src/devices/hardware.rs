//! Register-mapped lane devices
//!
//! Gates, loop sensors, the plate camera and the display are addressed as
//! coils and 16-bit holding registers on a field bus. The bus itself is a
//! port; [`MemoryBus`] keeps the whole address space in memory.

use async_trait::async_trait;
use dashmap::DashMap;
use garage_ports::{
    DeviceLink, DisplayPanel, GateDriver, HardwareError, HardwareResult, PlateCapture,
    PlateReading, PresenceSensor,
};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Characters in a plate register block
const PLATE_REGISTERS: u16 = 7;
/// Confidence is reported in thousandths
const CONFIDENCE_SCALE: f64 = 1000.0;

/// Port for coil and register access on the device bus
#[async_trait]
pub trait FieldBus: DeviceLink {
    async fn read_coil(&self, address: u16) -> HardwareResult<bool>;

    async fn write_coil(&self, address: u16, value: bool) -> HardwareResult<()>;

    async fn read_registers(&self, address: u16, count: u16) -> HardwareResult<Vec<u16>>;

    async fn write_register(&self, address: u16, value: u16) -> HardwareResult<()>;
}

/// Coil addresses of one gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateCoils {
    /// Output: drive the barrier up
    pub open: u16,
    /// Output: drive the barrier down
    pub close: u16,
    /// Input: set by the passage loop once the vehicle has crossed
    pub passage: u16,
}

impl GateCoils {
    /// Conventional layout for a device at `base`: open, close, passage
    ///
    /// `None` when the block does not fit below `u16::MAX`.
    pub fn at(base: u16) -> Option<Self> {
        Some(Self {
            open: base,
            close: base.checked_add(1)?,
            passage: base.checked_add(2)?,
        })
    }
}

pub struct CoilGate {
    bus: Arc<dyn FieldBus>,
    coils: GateCoils,
    poll: Duration,
}

impl CoilGate {
    pub fn new(bus: Arc<dyn FieldBus>, coils: GateCoils) -> Self {
        Self {
            bus,
            coils,
            poll: Duration::from_millis(200),
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }
}

#[async_trait]
impl GateDriver for CoilGate {
    async fn open(&self) -> HardwareResult<()> {
        // Passage is latched per cycle
        self.bus.write_coil(self.coils.passage, false).await?;
        self.bus.write_coil(self.coils.close, false).await?;
        self.bus.write_coil(self.coils.open, true).await
    }

    async fn close(&self) -> HardwareResult<()> {
        self.bus.write_coil(self.coils.open, false).await?;
        self.bus.write_coil(self.coils.close, true).await
    }

    async fn sense_passage(&self, timeout: Duration) -> HardwareResult<bool> {
        let wait = async {
            loop {
                if self.bus.read_coil(self.coils.passage).await? {
                    return Ok::<bool, HardwareError>(true);
                }
                sleep(self.poll).await;
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}

pub struct CoilPresenceSensor {
    bus: Arc<dyn FieldBus>,
    address: u16,
}

impl CoilPresenceSensor {
    pub fn new(bus: Arc<dyn FieldBus>, address: u16) -> Self {
        Self { bus, address }
    }
}

#[async_trait]
impl PresenceSensor for CoilPresenceSensor {
    async fn detect(&self) -> HardwareResult<bool> {
        self.bus.read_coil(self.address).await
    }
}

/// Camera publishing its last read in a register block
///
/// Seven registers hold one ASCII character each, followed by one register
/// with the confidence in thousandths. All-zero characters mean no read.
pub struct RegisterPlateCapture {
    bus: Arc<dyn FieldBus>,
    base: u16,
}

impl RegisterPlateCapture {
    pub fn new(bus: Arc<dyn FieldBus>, base: u16) -> Self {
        Self { bus, base }
    }
}

#[async_trait]
impl PlateCapture for RegisterPlateCapture {
    async fn capture(&self) -> HardwareResult<Option<PlateReading>> {
        let registers = self
            .bus
            .read_registers(self.base, PLATE_REGISTERS + 1)
            .await?;
        if registers.len() <= PLATE_REGISTERS as usize {
            return Err(HardwareError::Read {
                address: self.base,
                reason: format!(
                    "expected {} registers, bus returned {}",
                    PLATE_REGISTERS + 1,
                    registers.len()
                ),
            });
        }
        let (chars, confidence) = registers.split_at(PLATE_REGISTERS as usize);

        if chars.iter().all(|&r| r == 0) {
            return Ok(None);
        }

        let mut plate = String::with_capacity(chars.len());
        for (offset, &register) in chars.iter().enumerate() {
            let byte = u8::try_from(register)
                .ok()
                .filter(|b| b.is_ascii())
                .ok_or_else(|| HardwareError::Read {
                    address: self.base.saturating_add(offset as u16),
                    reason: format!("not an ASCII character: {register:#06x}"),
                })?;
            if byte != 0 {
                plate.push(char::from(byte));
            }
        }

        let confidence = confidence.first().copied().unwrap_or(0);
        let confidence = (f64::from(confidence) / CONFIDENCE_SCALE).min(1.0);
        debug!("Camera registers at {}: {} ({:.3})", self.base, plate, confidence);
        Ok(Some(PlateReading::new(plate, confidence)))
    }
}

/// Display showing the free-slot count from a single register
pub struct RegisterDisplay {
    bus: Arc<dyn FieldBus>,
    address: u16,
}

impl RegisterDisplay {
    pub fn new(bus: Arc<dyn FieldBus>, address: u16) -> Self {
        Self { bus, address }
    }
}

#[async_trait]
impl DisplayPanel for RegisterDisplay {
    async fn show(&self, free: usize, _total: usize) -> HardwareResult<()> {
        let value = u16::try_from(free).unwrap_or(u16::MAX);
        self.bus.write_register(self.address, value).await
    }
}

/// In-memory coil/register space
///
/// Unset addresses read as zero. Every access fails while disconnected.
pub struct MemoryBus {
    name: String,
    connected: AtomicBool,
    coils: DashMap<u16, bool>,
    registers: DashMap<u16, u16>,
}

impl MemoryBus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: AtomicBool::new(false),
            coils: DashMap::new(),
            registers: DashMap::new(),
        }
    }

    pub fn coil(&self, address: u16) -> bool {
        self.coils.get(&address).map(|c| *c).unwrap_or(false)
    }

    pub fn set_coil(&self, address: u16, value: bool) {
        self.coils.insert(address, value);
    }

    pub fn register(&self, address: u16) -> u16 {
        self.registers.get(&address).map(|r| *r).unwrap_or(0)
    }

    pub fn set_register(&self, address: u16, value: u16) {
        self.registers.insert(address, value);
    }

    /// Store a camera read in the layout [`RegisterPlateCapture`] expects
    pub fn load_plate(&self, base: u16, plate: &str, confidence: f64) {
        for offset in 0..PLATE_REGISTERS {
            let byte = plate.as_bytes().get(offset as usize).copied().unwrap_or(0);
            if let Some(address) = base.checked_add(offset) {
                self.set_register(address, u16::from(byte));
            }
        }
        let confidence = (confidence.clamp(0.0, 1.0) * CONFIDENCE_SCALE).round() as u16;
        if let Some(address) = base.checked_add(PLATE_REGISTERS) {
            self.set_register(address, confidence);
        }
    }

    fn ensure_connected(&self) -> HardwareResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(HardwareError::NotConnected(self.name.clone()))
        }
    }
}

#[async_trait]
impl DeviceLink for MemoryBus {
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

#[async_trait]
impl FieldBus for MemoryBus {
    async fn read_coil(&self, address: u16) -> HardwareResult<bool> {
        self.ensure_connected()?;
        Ok(self.coil(address))
    }

    async fn write_coil(&self, address: u16, value: bool) -> HardwareResult<()> {
        self.ensure_connected()?;
        self.set_coil(address, value);
        Ok(())
    }

    async fn read_registers(&self, address: u16, count: u16) -> HardwareResult<Vec<u16>> {
        self.ensure_connected()?;
        let end = address.checked_add(count).ok_or_else(|| HardwareError::Read {
            address,
            reason: format!("{count} registers overflow the address space"),
        })?;
        Ok((address..end).map(|a| self.register(a)).collect())
    }

    async fn write_register(&self, address: u16, value: u16) -> HardwareResult<()> {
        self.ensure_connected()?;
        self.set_register(address, value);
        Ok(())
    }
}
