//! Per-link latency, bandwidth and loss injection
//!
//! [`LatencyShaper`] sits logically between the protocol and a reliable
//! ordered pipe, the same way a production transport would wrap a socket to
//! add QoS — except the numbers are synthetic, driving a simulated WAN
//! instead of a real one. Embedding the shaper in the transport rather than
//! the protocol keeps the protocol unaware of whether it runs over loopback
//! or a simulated long-haul link.

use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// `{one_way_delay_ms, bandwidth_bps | unlimited, loss_probability}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub one_way_delay_ms: u64,
    /// `None` means unlimited bandwidth (no token bucket delay)
    pub bandwidth_bps: Option<u64>,
    pub loss_probability: f64,
}

impl NetworkProfile {
    pub const fn unlimited(one_way_delay_ms: u64) -> Self {
        NetworkProfile {
            one_way_delay_ms,
            bandwidth_bps: None,
            loss_probability: 0.0,
        }
    }

    /// `one_way_delay_ms <= 50` is the LAN/WAN split used in the protocol's
    /// production-sized test scenarios.
    pub fn is_lan(&self) -> bool {
        self.one_way_delay_ms <= 50
    }
}

/// Token bucket capacity, expressed as seconds of burst at the configured
/// bandwidth. A message that exceeds the burst simply pays the remaining
/// deficit as additional delay rather than being rejected.
const BUCKET_BURST_SECONDS: f64 = 1.0;

/// One nanosecond of slack enforced between two messages on the same
/// directed link, so that back-to-back "equal delay" messages still deliver
/// in the order they were planned rather than racing.
const FIFO_EPSILON: Duration = Duration::from_nanos(1);

pub enum DeliveryPlan {
    Deliver(Instant),
    Drop,
}

struct ShaperState {
    tokens: f64,
    last_refill: Instant,
    next_free_at: Instant,
}

/// Shapes one directed link (a single sender -> single receiver pipe).
/// Owns its own token bucket and FIFO cursor; a bidirectional pair of
/// participants gets two independent `LatencyShaper`s.
pub struct LatencyShaper {
    profile: NetworkProfile,
    state: Mutex<ShaperState>,
}

impl LatencyShaper {
    pub fn new(profile: NetworkProfile) -> Self {
        let now = Instant::now();
        let tokens = profile
            .bandwidth_bps
            .map(|bps| bps as f64 * BUCKET_BURST_SECONDS)
            .unwrap_or(0.0);
        LatencyShaper {
            profile,
            state: Mutex::new(ShaperState {
                tokens,
                last_refill: now,
                next_free_at: now,
            }),
        }
    }

    pub fn profile(&self) -> NetworkProfile {
        self.profile
    }

    /// Synchronously decides when a message of `len` bytes should be
    /// delivered (or that it's lost). Must be invoked from a single
    /// call-site per link — the [`MessageBus`](crate::MessageBus) serializes
    /// sends per destination so this always holds — otherwise the FIFO
    /// ordering promise (`next_free_at` strictly increasing) doesn't hold.
    pub fn plan(&self, len: usize, rng: &mut impl Rng) -> DeliveryPlan {
        if self.profile.loss_probability > 0.0 && rng.gen::<f64>() < self.profile.loss_probability
        {
            return DeliveryPlan::Drop;
        }

        let mut state = self.state.lock().expect("shaper mutex poisoned");
        let now = Instant::now();

        let bandwidth_delay = match self.profile.bandwidth_bps {
            None => Duration::ZERO,
            Some(bps) => {
                let elapsed = now.saturating_duration_since(state.last_refill);
                let cap = bps as f64 * BUCKET_BURST_SECONDS;
                state.tokens = (state.tokens + elapsed.as_secs_f64() * bps as f64).min(cap);
                state.last_refill = now;

                let cost = len as f64;
                if state.tokens >= cost {
                    state.tokens -= cost;
                    Duration::ZERO
                } else {
                    let deficit = cost - state.tokens;
                    state.tokens = 0.0;
                    Duration::from_secs_f64(deficit / bps as f64)
                }
            }
        };

        let earliest = now + Duration::from_millis(self.profile.one_way_delay_ms) + bandwidth_delay;
        let at = earliest.max(state.next_free_at);
        state.next_free_at = at + FIFO_EPSILON;

        DeliveryPlan::Deliver(at)
    }
}
