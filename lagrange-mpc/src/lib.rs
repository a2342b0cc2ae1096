//! Semi-honest N-party reconstruction of a value shared across points on a
//! private polynomial, via additive secret sharing and Lagrange
//! interpolation over a simulated, independently-shaped network per link.
//!
//! [`Coordinator::run`] is the entry point: give it a [`RunConfig`] (group
//! parameters, participant count, network profile) and it wires up the
//! simulated bus, spawns one [`Participant`] task per party, and returns a
//! [`RunRecord`] describing what happened.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod metrics;
pub mod participant;

pub use config::RunConfig;
pub use coordinator::{Coordinator, RunRecord};
pub use errors::{ErrorKind, ParticipantError, ProtocolViolation, RunError};
pub use participant::{Participant, ParticipantOutcome, PartialResult, PrivatePoint};

pub use group_arith;
pub use net;

/// Runs one protocol instance to completion. Thin wrapper over
/// [`Coordinator::run`] for callers that don't need the builder-style
/// surface (picking `inputs` vs. letting `test_mode` generate them).
pub async fn run(config: RunConfig, inputs: Option<Vec<PrivatePoint>>) -> Result<RunRecord, RunError> {
    Coordinator::run(config, inputs).await
}
