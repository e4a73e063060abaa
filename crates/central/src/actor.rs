//! Single-owner actor around [`CentralAuthority`]
//!
//! Every event, admin command and stats query is a message on one mpsc
//! queue, answered over a oneshot. The actor processes them strictly in
//! arrival order.

use async_trait::async_trait;
use garage_core::{Event, EventResponse, Vehicle};
use garage_gateway::{Requester, TransportError};
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::authority::{CentralAuthority, CentralStats};
use crate::error::{CentralError, Result};
use crate::flags::{AdminCommand, AdminFlags};

/// Default queue depth for the command channel
pub const DEFAULT_CAPACITY: usize = 1024;

/// Commands that can be sent to the central actor
#[derive(Debug)]
pub enum CentralCommand {
    Process {
        event: Event,
        response: oneshot::Sender<EventResponse>,
    },

    Admin {
        command: AdminCommand,
        response: oneshot::Sender<AdminFlags>,
    },

    Stats {
        response: oneshot::Sender<CentralStats>,
    },

    ParkedVehicles {
        response: oneshot::Sender<Vec<Vehicle>>,
    },
}

/// Handle to communicate with the actor
#[derive(Clone)]
pub struct CentralHandle {
    sender: mpsc::Sender<CentralCommand>,
    clients: Arc<AtomicUsize>,
}

impl CentralHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CentralCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| CentralError::ActorStopped)?;
        rx.await.map_err(|_| CentralError::ActorStopped)
    }

    /// Submit a lane event and wait for the decision
    pub async fn process(&self, event: Event) -> Result<EventResponse> {
        self.call(|response| CentralCommand::Process { event, response })
            .await
    }

    /// Execute an operator command, returning the flags after it
    pub async fn admin(&self, command: AdminCommand) -> Result<AdminFlags> {
        self.call(|response| CentralCommand::Admin { command, response })
            .await
    }

    pub async fn stats(&self) -> Result<CentralStats> {
        let mut stats = self
            .call(|response| CentralCommand::Stats { response })
            .await?;
        stats.connected_clients = self.connected_clients();
        Ok(stats)
    }

    pub async fn parked_vehicles(&self) -> Result<Vec<Vehicle>> {
        self.call(|response| CentralCommand::ParkedVehicles { response })
            .await
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    /// Count a client for as long as the returned guard lives
    pub fn track_client(&self) -> ClientGuard {
        self.clients.fetch_add(1, Ordering::Relaxed);
        ClientGuard {
            clients: Arc::clone(&self.clients),
        }
    }
}

/// Lanes running in the same process can use the handle directly
#[async_trait]
impl Requester<Event, EventResponse> for CentralHandle {
    async fn request(&self, req: &Event) -> std::result::Result<EventResponse, TransportError> {
        self.process(req.clone())
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Decrements the connected-client count on drop
pub struct ClientGuard {
    clients: Arc<AtomicUsize>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Task that exclusively owns the authority
pub struct CentralActor {
    authority: CentralAuthority,
    receiver: mpsc::Receiver<CentralCommand>,
}

impl CentralActor {
    /// Spawn the actor on the current runtime and return its handle
    ///
    /// The actor stops once every handle has been dropped.
    pub fn spawn(authority: CentralAuthority, capacity: usize) -> (CentralHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = CentralHandle {
            sender,
            clients: Arc::new(AtomicUsize::new(0)),
        };
        let actor = CentralActor {
            authority,
            receiver,
        };
        let task = tokio::spawn(actor.run());
        (handle, task)
    }

    /// Main loop - processes commands sequentially
    async fn run(mut self) {
        info!("Central actor started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                CentralCommand::Process { event, response } => {
                    let reply = self.authority.process_event(event).await;
                    if response.send(reply).is_err() {
                        // The decision is committed even if nobody waits for it
                        debug!("Requester went away before the reply");
                    }
                }
                CentralCommand::Admin { command, response } => {
                    let _ = response.send(self.authority.apply(command));
                }
                CentralCommand::Stats { response } => {
                    let _ = response.send(self.authority.stats().await);
                }
                CentralCommand::ParkedVehicles { response } => {
                    let _ = response.send(self.authority.parked_vehicles());
                }
            }
        }

        info!("Central actor stopped");
    }
}
