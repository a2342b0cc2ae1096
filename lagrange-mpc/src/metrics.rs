//! Per-participant time accounting
//!
//! Each [`Participant`](crate::participant::Participant) owns one
//! `MetricsSink` for the duration of its run and hands the two accumulated
//! totals back to the coordinator in its `ParticipantOutcome`; nothing here
//! is shared across tasks, so there's no locking to get wrong.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Computing,
    Waiting,
}

/// Tracks wall-clock time a participant spends computing versus blocked on
/// the network, bucketing whatever elapsed between two consecutive calls
/// into whichever phase was active when the first one fired.
pub struct MetricsSink {
    phase: Phase,
    last: Instant,
    compute_ns: u64,
    network_wait_ns: u64,
}

/// Transition hooks a participant calls around each phase of its run.
/// Exists mainly so `Participant::run_inner` reads as a sequence of named
/// phase transitions rather than raw `Instant` arithmetic sprinkled through
/// the protocol logic.
pub trait Tracer {
    fn compute_begins(&mut self);
    fn compute_ends(&mut self);
    fn recv_begins(&mut self);
    fn recv_ends(&mut self);
}

impl MetricsSink {
    pub fn new() -> Self {
        MetricsSink {
            phase: Phase::Idle,
            last: Instant::now(),
            compute_ns: 0,
            network_wait_ns: 0,
        }
    }

    fn switch_to(&mut self, next: Phase) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        match self.phase {
            Phase::Computing => self.compute_ns += elapsed.as_nanos() as u64,
            Phase::Waiting => self.network_wait_ns += elapsed.as_nanos() as u64,
            Phase::Idle => {}
        }
        self.phase = next;
        self.last = now;
    }

    pub fn compute_ns(&self) -> u64 {
        self.compute_ns
    }

    pub fn network_wait_ns(&self) -> u64 {
        self.network_wait_ns
    }
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for MetricsSink {
    fn compute_begins(&mut self) {
        self.switch_to(Phase::Computing);
    }

    fn compute_ends(&mut self) {
        self.switch_to(Phase::Idle);
    }

    fn recv_begins(&mut self) {
        self.switch_to(Phase::Waiting);
    }

    fn recv_ends(&mut self) {
        self.switch_to(Phase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn accumulates_into_the_phase_that_was_active() {
        let mut sink = MetricsSink::new();
        sink.compute_begins();
        sleep(Duration::from_millis(5));
        sink.recv_begins();
        sleep(Duration::from_millis(5));
        sink.recv_ends();

        assert!(sink.compute_ns() >= Duration::from_millis(5).as_nanos() as u64);
        assert!(sink.network_wait_ns() >= Duration::from_millis(5).as_nanos() as u64);
    }
}
