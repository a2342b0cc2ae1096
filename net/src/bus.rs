//! Point-to-point async messaging between a fixed, pre-known set of
//! participant IDs, shaped by a per-link [`LatencyShaper`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::thread_rng;
use tokio::sync::{mpsc, watch};

use crate::errors::{BusClosed, BusError, PeerUnreachable};
use crate::shaper::{DeliveryPlan, LatencyShaper, NetworkProfile};

/// Inbound channel depth per participant. Generous relative to a single
/// run's message count (at most two rounds, N-1 messages each) so a slow
/// receiver never forces a sender to block mid-round.
const INBOX_CAPACITY: usize = 256;

struct Hub {
    n: u16,
    /// `shapers[from][to]` — one independent shaper per directed link
    shapers: Vec<Vec<LatencyShaper>>,
    outboxes: Vec<mpsc::Sender<(u16, Vec<u8>)>>,
    closed_tx: watch::Sender<bool>,
    bytes_sent: Vec<AtomicU64>,
    bytes_recv: Vec<AtomicU64>,
}

/// A participant's handle onto the shared bus: send to / broadcast to peers,
/// receive from any peer, observe byte counters, and close the whole bus.
pub struct MessageBus {
    id: u16,
    hub: Arc<Hub>,
    inbox: mpsc::Receiver<(u16, Vec<u8>)>,
    closed_rx: watch::Receiver<bool>,
}

/// Builds a fully-connected bus for `n` participants, every directed link
/// shaped identically by `profile`.
pub fn build_network(n: u16, profile: NetworkProfile) -> Vec<MessageBus> {
    let (closed_tx, closed_rx) = watch::channel(false);

    let mut outboxes = Vec::with_capacity(n as usize);
    let mut inboxes = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        outboxes.push(tx);
        inboxes.push(rx);
    }

    let shapers = (0..n)
        .map(|_| (0..n).map(|_| LatencyShaper::new(profile)).collect())
        .collect();

    let bytes_sent = (0..n).map(|_| AtomicU64::new(0)).collect();
    let bytes_recv = (0..n).map(|_| AtomicU64::new(0)).collect();

    let hub = Arc::new(Hub {
        n,
        shapers,
        outboxes,
        closed_tx,
        bytes_sent,
        bytes_recv,
    });

    inboxes
        .into_iter()
        .enumerate()
        .map(|(id, inbox)| MessageBus {
            id: id as u16,
            hub: hub.clone(),
            inbox,
            closed_rx: closed_rx.clone(),
        })
        .collect()
}

/// A handle that can close the bus without taking ownership of a
/// participant's [`MessageBus`] — handed to a coordinator so it can enforce
/// a deadline or react to one participant's failure without needing to hold
/// onto every other participant's send/recv handle.
#[derive(Clone)]
pub struct BusCloser(Arc<Hub>);

impl BusCloser {
    pub fn close(&self) {
        let _ = self.0.closed_tx.send(true);
    }
}

impl MessageBus {
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn closer(&self) -> BusCloser {
        BusCloser(self.hub.clone())
    }

    pub fn participant_count(&self) -> u16 {
        self.hub.n
    }

    /// Enqueues `bytes` into the shaped outbound pipe to `to`. Returns once
    /// the local send buffer has accepted the bytes, not once delivered.
    pub async fn send(&self, to: u16, bytes: Vec<u8>) -> Result<(), BusError> {
        if *self.closed_rx.borrow() {
            return Err(PeerUnreachable(to).into());
        }
        if to >= self.hub.n || to == self.id {
            return Err(PeerUnreachable(to).into());
        }

        self.hub.bytes_sent[usize::from(self.id)].fetch_add(bytes.len() as u64, Ordering::Relaxed);

        let shaper = &self.hub.shapers[usize::from(self.id)][usize::from(to)];
        match shaper.plan(bytes.len(), &mut thread_rng()) {
            DeliveryPlan::Drop => {
                // Loss is fatal under this protocol's contract (see design
                // notes on the open loss-handling question): the message is
                // simply never delivered, surfacing later as a Timeout.
                tracing::warn!(from = self.id, to, "message dropped by network profile");
                Ok(())
            }
            DeliveryPlan::Deliver(at) => {
                let outbox = self.hub.outboxes[usize::from(to)].clone();
                let from = self.id;
                tokio::spawn(async move {
                    tokio::time::sleep_until(at).await;
                    // A closed receiver just drops the message; the sender
                    // already returned Ok when it accepted the send.
                    let _ = outbox.send((from, bytes)).await;
                });
                Ok(())
            }
        }
    }

    /// Logically `n-1` sends, one per peer, each shaped independently
    pub async fn broadcast(&self, bytes: Vec<u8>) -> Result<(), BusError> {
        for to in 0..self.hub.n {
            if to == self.id {
                continue;
            }
            self.send(to, bytes.clone()).await?;
        }
        Ok(())
    }

    /// Blocks until a message arrives or the bus is shut down
    pub async fn recv(&mut self) -> Result<(u16, Vec<u8>), BusError> {
        loop {
            if *self.closed_rx.borrow() {
                return Err(BusClosed.into());
            }
            tokio::select! {
                biased;
                changed = self.closed_rx.changed() => {
                    if changed.is_err() {
                        return Err(BusClosed.into());
                    }
                    // loop back around: either now closed, or a spurious
                    // wakeup from the watch channel, check again
                }
                msg = self.inbox.recv() => {
                    match msg {
                        Some((from, bytes)) => {
                            self.hub.bytes_recv[usize::from(self.id)]
                                .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                            return Ok((from, bytes));
                        }
                        None => return Err(BusClosed.into()),
                    }
                }
            }
        }
    }

    /// Idempotent; unblocks every pending `recv` across all participants'
    /// handles with `BusClosed`
    pub fn close(&self) {
        tracing::debug!(party = self.id, "closing bus");
        let _ = self.hub.closed_tx.send(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    pub fn bytes_sent(&self) -> u64 {
        self.hub.bytes_sent[usize::from(self.id)].load(Ordering::Relaxed)
    }

    pub fn bytes_recv(&self) -> u64 {
        self.hub.bytes_recv[usize::from(self.id)].load(Ordering::Relaxed)
    }
}
