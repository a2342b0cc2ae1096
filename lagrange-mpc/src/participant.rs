//! A single participant's walk through the two-round protocol: share a
//! random additive split of its point with every peer, then broadcast a
//! Lagrange-weighted partial sum, then add up what comes back.

use std::collections::HashMap;

use group_arith::{lagrange_coefficient, GroupArith, Scalar};
use net::{wire, MessageBus};

use crate::errors::{ParticipantError, ProtocolViolation};
use crate::metrics::{MetricsSink, Tracer};

/// One participant's secret input: its public abscissa `x` and its private
/// ordinate `y`. `y` never leaves this struct except split into additive
/// shares handed to peers.
#[derive(Debug, Clone)]
pub struct PrivatePoint {
    pub x: Scalar,
    pub y: Scalar,
}

/// One participant's round-2 broadcast value, tagged with its sender. Exposed
/// as a standalone type so a caller that has persisted a run's partials (or
/// collected them some other way) can reconstruct `f(eval_at)` without
/// redriving the whole protocol — the live path always goes through
/// [`Participant::aggregate_round`] instead, which folds the combination in.
#[derive(Debug, Clone)]
pub struct PartialResult {
    pub id: u16,
    pub value: Scalar,
}

impl PartialResult {
    /// Sums every partial's `value` mod `q`, reconstructing `f(eval_at)`.
    /// Callers are responsible for supplying exactly one partial per
    /// participant; duplicates or missing contributors silently produce the
    /// wrong sum, the same trust assumption `Participant::aggregate_round`
    /// makes about its own round-2 messages.
    pub fn combine(arith: &GroupArith, partials: &[PartialResult]) -> Scalar {
        partials
            .iter()
            .fold(Scalar::zero(), |acc, partial| arith.add_scalar(&acc, &partial.value))
    }
}

/// What a participant hands back to the coordinator once its run finishes:
/// the reconstructed value plus the bookkeeping the coordinator folds into
/// the run's `RunRecord`.
#[derive(Debug, Clone)]
pub struct ParticipantOutcome {
    pub id: u16,
    pub result: Scalar,
    pub compute_ns: u64,
    pub network_wait_ns: u64,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

pub struct Participant {
    id: u16,
    arith: GroupArith,
    point: PrivatePoint,
    /// Public abscissas of every participant in the run, indexed by id
    xs: Vec<Scalar>,
    eval_at: Scalar,
    bus: MessageBus,
}

impl Participant {
    pub fn new(
        id: u16,
        arith: GroupArith,
        point: PrivatePoint,
        xs: Vec<Scalar>,
        eval_at: Scalar,
        bus: MessageBus,
    ) -> Self {
        Participant {
            id,
            arith,
            point,
            xs,
            eval_at,
            bus,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Runs the protocol to completion. On any failure the bus is closed
    /// before the error is returned, so every peer still blocked in `recv`
    /// unblocks with `BusClosed` rather than hanging until the coordinator's
    /// deadline.
    pub async fn run(mut self) -> Result<ParticipantOutcome, ParticipantError> {
        let id = self.id;
        let result = self.run_inner().await;
        if let Err(err) = &result {
            tracing::error!(party = id, error = %err, "participant failed, closing bus");
            self.bus.close();
        } else {
            tracing::debug!(party = id, "participant reached Done");
        }
        result
    }

    async fn run_inner(&mut self) -> Result<ParticipantOutcome, ParticipantError> {
        let mut metrics = MetricsSink::new();
        let n = self.xs.len() as u16;

        // Every holder needs the *originator's* lambda, not its own: the
        // column participant i holds is {s_{k,i}}_k, one share from each
        // originator k, and the protocol's target Σ_k λ_k·y_k only falls out
        // if each s_{k,i} is weighted by λ_k before summing.
        metrics.compute_begins();
        let lambdas = Self::all_lagrange_coefficients(&self.arith, &self.xs, &self.eval_at)?;
        metrics.compute_ends();

        tracing::trace!(party = self.id, "Sharing: drawing shares for {} peers", n - 1);
        let r_ii = self.share_round(&mut metrics).await?;

        tracing::trace!(party = self.id, "Exchanging: awaiting {} SHARE messages", n - 1);
        let received = self.exchange_round(&mut metrics, n).await?;

        metrics.compute_begins();
        let mut p_i = self
            .arith
            .mul_scalar(&lambdas[usize::from(self.id)], &r_ii);
        for (&from, value) in &received {
            let weighted = self.arith.mul_scalar(&lambdas[usize::from(from)], value);
            p_i = self.arith.add_scalar(&p_i, &weighted);
        }
        metrics.compute_ends();

        tracing::trace!(party = self.id, "Broadcasting partial result");
        self.broadcast_round(&p_i).await?;

        tracing::trace!(party = self.id, "Aggregating: awaiting {} PARTIAL messages", n - 1);
        let partials = self.aggregate_round(&mut metrics, n, &p_i).await?;

        metrics.compute_begins();
        let mut f = Scalar::zero();
        for value in partials.values() {
            f = self.arith.add_scalar(&f, value);
        }
        metrics.compute_ends();

        Ok(ParticipantOutcome {
            id: self.id,
            result: f,
            compute_ns: metrics.compute_ns(),
            network_wait_ns: metrics.network_wait_ns(),
            bytes_sent: self.bus.bytes_sent(),
            bytes_recv: self.bus.bytes_recv(),
        })
    }

    /// Draws `n-1` random shares, one per peer, sized so that together with
    /// this participant's own residual share they sum to `y_i`; sends each
    /// peer its share and returns the residual kept locally (`r_{i,i}`).
    async fn share_round(&mut self, metrics: &mut MetricsSink) -> Result<Scalar, ParticipantError> {
        let n = self.xs.len() as u16;

        metrics.compute_begins();
        let mut shares = HashMap::new();
        let mut running_sum = Scalar::zero();
        for peer in peers(self.id, n) {
            let r = self.arith.random_scalar()?;
            running_sum = self.arith.add_scalar(&running_sum, &r);
            shares.insert(peer, r);
        }
        let r_ii = self.arith.sub_scalar(&self.point.y, &running_sum);
        metrics.compute_ends();

        for (peer, share) in shares {
            let frame = wire::Frame {
                kind: wire::MessageKind::Share,
                round: 1,
                sender_id: self.id,
                value: share.to_be_bytes(self.arith.params()),
            };
            self.bus.send(peer, wire::encode(&frame)).await?;
        }

        Ok(r_ii)
    }

    /// Lagrange coefficient for every participant index, in id order, so a
    /// holder can weight each share it receives by its originator's λ rather
    /// than its own.
    fn all_lagrange_coefficients(
        arith: &GroupArith,
        xs: &[Scalar],
        eval_at: &Scalar,
    ) -> Result<Vec<Scalar>, ParticipantError> {
        (0..xs.len())
            .map(|i| lagrange_coefficient(arith, xs, i, eval_at).map_err(ParticipantError::from))
            .collect()
    }

    /// Blocks until exactly one SHARE has arrived from every other
    /// participant, rejecting duplicates, wrong rounds and malformed frames
    /// as `ProtocolViolation`.
    async fn exchange_round(
        &mut self,
        metrics: &mut MetricsSink,
        n: u16,
    ) -> Result<HashMap<u16, Scalar>, ParticipantError> {
        self.collect_round(metrics, n, wire::MessageKind::Share, 1, "SHARE")
            .await
    }

    async fn broadcast_round(&mut self, p_i: &Scalar) -> Result<(), ParticipantError> {
        let frame = wire::Frame {
            kind: wire::MessageKind::Partial,
            round: 2,
            sender_id: self.id,
            value: p_i.to_be_bytes(self.arith.params()),
        };
        self.bus.broadcast(wire::encode(&frame)).await?;
        Ok(())
    }

    async fn aggregate_round(
        &mut self,
        metrics: &mut MetricsSink,
        n: u16,
        p_i: &Scalar,
    ) -> Result<HashMap<u16, Scalar>, ParticipantError> {
        let mut partials = self
            .collect_round(metrics, n, wire::MessageKind::Partial, 2, "PARTIAL")
            .await?;
        partials.insert(self.id, p_i.clone());
        Ok(partials)
    }

    /// Shared bookkeeping for both rounds: waits for one message of `kind`
    /// at `round` from every peer, erroring on anything that doesn't fit.
    async fn collect_round(
        &mut self,
        metrics: &mut MetricsSink,
        n: u16,
        kind: wire::MessageKind,
        round: u8,
        kind_name: &'static str,
    ) -> Result<HashMap<u16, Scalar>, ParticipantError> {
        let mut received = HashMap::new();
        while received.len() + 1 < usize::from(n) {
            metrics.recv_begins();
            let (from, bytes) = self.bus.recv().await?;
            metrics.recv_ends();

            metrics.compute_begins();
            let frame = wire::decode(&bytes, self.arith.params().scalar_byte_len()).map_err(
                |source| ProtocolViolation::MalformedFrame { from, source },
            )?;
            if frame.kind != kind || frame.round != round {
                tracing::warn!(party = self.id, from, expected = kind_name, "unexpected message kind/round");
                return Err(ProtocolViolation::UnexpectedMessage { from }.into());
            }
            if received.contains_key(&from) {
                tracing::warn!(party = self.id, from, kind = kind_name, "duplicate sender");
                return Err(ProtocolViolation::DuplicateSender {
                    kind: kind_name,
                    from,
                }
                .into());
            }
            let value = Scalar::from_be_bytes(&frame.value, self.arith.params());
            received.insert(from, value);
            metrics.compute_ends();
        }
        Ok(received)
    }
}

fn peers(id: u16, n: u16) -> impl Iterator<Item = u16> {
    (0..n).filter(move |&p| p != id)
}
