//! The serializable description of one run: group parameters, participant
//! count, network profile and the knobs around deadline/verification.

use group_arith::Integer;
use net::NetworkProfile;
use serde::{Deserialize, Serialize};

fn default_eval_at() -> Integer {
    Integer::new()
}

fn default_deadline_ms() -> u64 {
    60_000
}

/// External configuration for one [`Coordinator::run`](crate::coordinator::Coordinator::run)
/// call. Everything here is meant to come from a config file or CLI flags,
/// not computed mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub prime_p: Integer,
    pub order_q: Integer,
    pub generator_g: Integer,
    /// Point at which the shared polynomial is evaluated; `0` reconstructs
    /// the secret itself.
    #[serde(default = "default_eval_at")]
    pub eval_at: Integer,
    pub n: u16,
    pub profile: NetworkProfile,
    /// Wall-clock budget for the whole run before it's abandoned as timed
    /// out. Defaults to one minute.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// When true and no explicit inputs are supplied, the coordinator
    /// generates a random polynomial itself and cross-checks the
    /// reconstructed value against the clear-text evaluation.
    #[serde(default)]
    pub test_mode: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            prime_p: Integer::new(),
            order_q: Integer::new(),
            generator_g: Integer::new(),
            eval_at: default_eval_at(),
            n: 0,
            profile: NetworkProfile::unlimited(0),
            deadline_ms: default_deadline_ms(),
            test_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_defaults_to_one_minute() {
        let config = RunConfig {
            prime_p: Integer::from(23),
            order_q: Integer::from(11),
            generator_g: Integer::from(2),
            ..RunConfig::default()
        };
        assert_eq!(config.deadline_ms, 60_000);
        assert!(!config.test_mode);
    }
}
