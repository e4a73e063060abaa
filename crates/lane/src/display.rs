//! Free-slot display refresh

use garage_ports::DisplayPanel;
use garage_slots::{SlotBoard, SlotStats};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::watch;

/// Forwards every SlotBoard snapshot to a display panel
pub struct DisplayRefresher {
    panel: Arc<dyn DisplayPanel>,
    updates: watch::Receiver<SlotStats>,
}

impl DisplayRefresher {
    pub fn new(board: &SlotBoard, panel: Arc<dyn DisplayPanel>) -> Self {
        Self {
            panel,
            updates: board.subscribe(),
        }
    }

    /// Show the current occupancy, then every change until shutdown
    ///
    /// A panel failure is logged and the next snapshot is tried again.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let (free, total) = {
                let stats = self.updates.borrow_and_update();
                (stats.free, stats.total)
            };
            match self.panel.show(free, total).await {
                Ok(()) => debug!("Display shows {}/{} free", free, total),
                Err(e) => warn!("Display refresh failed: {}", e),
            }

            tokio::select! {
                changed = self.updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    }
}
