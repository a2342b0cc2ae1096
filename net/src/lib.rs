//! Simulated point-to-point transport between MPC participants
//!
//! Three layers, dependency order bottom-up: [`wire`] (self-delimiting
//! framing), [`shaper`] (per-link delay/bandwidth/loss), [`bus`] (the
//! participant-facing send/recv/broadcast/close surface, built on top of
//! both).

mod bus;
mod errors;
mod shaper;
pub mod wire;

pub use bus::{build_network, BusCloser, MessageBus};
pub use errors::{BusClosed, BusError, BusErrorKind, PeerUnreachable, WireError};
pub use shaper::{DeliveryPlan, LatencyShaper, NetworkProfile};
