use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::error::HardwareResult;

/// Port for the connection that carries device traffic (serial bus, socket, ...)
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Open the connection
    async fn connect(&self) -> HardwareResult<()>;

    /// Close the connection; must be safe to call when already closed
    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    fn name(&self) -> &str {
        "DeviceLink"
    }
}

/// Scoped hold on a connected [`DeviceLink`]
///
/// The link is disconnected when the guard drops, on every exit path of the
/// owner (normal return, `?` propagation, task cancellation).
pub struct LinkGuard {
    link: Arc<dyn DeviceLink>,
}

impl LinkGuard {
    /// Connect the link and hold it until the guard is dropped
    pub async fn acquire(link: Arc<dyn DeviceLink>) -> HardwareResult<Self> {
        link.connect().await?;
        info!("Device link '{}' connected", link.name());
        Ok(Self { link })
    }

    pub fn link(&self) -> &Arc<dyn DeviceLink> {
        &self.link
    }
}

impl Drop for LinkGuard {
    fn drop(&mut self) {
        if self.link.is_connected() {
            self.link.disconnect();
            info!("Device link '{}' released", self.link.name());
        } else {
            warn!("Device link '{}' was already down on release", self.link.name());
        }
    }
}
