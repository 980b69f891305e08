//! Handoff between the network layer and the measurement loop.
//!
//! Network code runs on its own threads and only ever sends `LinkEvent`s into
//! a channel. The loop drains that channel once per iteration, so commands and
//! connection changes are applied between scheduler ticks, never during one.
//! At most one client is tracked; a newer connection replaces it.
use crossbeam_channel as xch;

pub type ClientId = u64;

#[derive(Debug)]
pub enum LinkEvent {
    /// A client finished its handshake. `outbox` carries text frames to it.
    Connected {
        id: ClientId,
        outbox: xch::Sender<String>,
    },
    Disconnected {
        id: ClientId,
    },
    /// One inbound message.
    Data {
        id: ClientId,
        bytes: Vec<u8>,
    },
}

/// Sending half handed to the network layer.
pub type LinkSender = xch::Sender<LinkEvent>;
/// Receiving half drained by the instrument.
pub type LinkReceiver = xch::Receiver<LinkEvent>;

pub fn event_channel() -> (LinkSender, LinkReceiver) {
    xch::unbounded()
}

/// What happened to one periodic broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastOutcome {
    /// Broadcast task was not due this tick.
    #[default]
    NotDue,
    /// No client attached; nothing sent.
    Skipped,
    Sent,
    /// Client outbox full; this payload was dropped.
    Dropped,
    /// Client outbox closed; the client was detached.
    Detached,
}

#[derive(Debug)]
struct Client {
    id: ClientId,
    outbox: xch::Sender<String>,
}

/// The single tracked client, if any.
#[derive(Debug, Default)]
pub struct Link {
    client: Option<Client>,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `id`, replacing any previous client.
    pub fn attach(&mut self, id: ClientId, outbox: xch::Sender<String>) {
        if let Some(prev) = self.client.replace(Client { id, outbox }) {
            tracing::debug!(prev = prev.id, id, "client replaced");
        } else {
            tracing::debug!(id, "client attached");
        }
    }

    /// Forget the tracked client if it is `id`. Returns whether it was.
    pub fn detach(&mut self, id: ClientId) -> bool {
        match &self.client {
            Some(c) if c.id == id => {
                self.client = None;
                tracing::debug!(id, "client detached");
                true
            }
            _ => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client.as_ref().map(|c| c.id)
    }

    /// Hand `text` to the tracked client without blocking.
    pub fn send(&mut self, text: String) -> BroadcastOutcome {
        let Some(client) = &self.client else {
            return BroadcastOutcome::Skipped;
        };
        match client.outbox.try_send(text) {
            Ok(()) => BroadcastOutcome::Sent,
            Err(xch::TrySendError::Full(_)) => {
                tracing::trace!(id = client.id, "client outbox full, payload dropped");
                BroadcastOutcome::Dropped
            }
            Err(xch::TrySendError::Disconnected(_)) => {
                let id = client.id;
                self.client = None;
                tracing::debug!(id, "client outbox closed, detached");
                BroadcastOutcome::Detached
            }
        }
    }
}
