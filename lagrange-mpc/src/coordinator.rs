//! Drives one end-to-end run: builds the simulated network, spawns one
//! participant task per party, enforces the run's deadline, and folds each
//! participant's outcome into a single `RunRecord`.

use std::time::{Duration, Instant};

use group_arith::{GroupArith, GroupParams, Scalar};
use net::NetworkProfile;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::config::RunConfig;
use crate::errors::{ErrorKind, ParticipantError, RunError};
use crate::participant::{Participant, PrivatePoint};

/// Everything recorded about one run, successful or not — the thing a
/// benchmarking harness or test assertion actually looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub participants_n: u16,
    pub network_profile: NetworkProfile,
    pub wall_clock_total: Duration,
    pub compute_ns: u64,
    pub network_wait_ns: u64,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub interpolated_value: Option<Scalar>,
    pub expected_value: Option<Scalar>,
    pub ok: bool,
    pub error_kind: Option<ErrorKind>,
}

pub struct Coordinator;

impl Coordinator {
    /// Runs the protocol once. `inputs`, when supplied, must have exactly
    /// `config.n` points with distinct abscissas; when omitted and
    /// `config.test_mode` is set, a random degree-`(n-1)` polynomial is
    /// sampled and evaluated at `x = 1..=n` so the run can be checked
    /// against a clear-text Lagrange evaluation.
    pub async fn run(
        config: RunConfig,
        inputs: Option<Vec<PrivatePoint>>,
    ) -> Result<RunRecord, RunError> {
        let params = GroupParams::new(
            config.prime_p.clone(),
            config.order_q.clone(),
            config.generator_g.clone(),
        )?;
        let arith = GroupArith::new(params.clone());
        let eval_at = Scalar::from_integer_mod_q(config.eval_at.clone(), &params);

        let points = match inputs {
            Some(points) => points,
            None if config.test_mode => generate_test_points(&arith, config.n)?,
            None => return Err(RunError::missing_inputs()),
        };

        let expected_value = if config.test_mode {
            let xs: Vec<Scalar> = points.iter().map(|p| p.x.clone()).collect();
            let ys: Vec<Scalar> = points.iter().map(|p| p.y.clone()).collect();
            Some(clear_text_interpolate(&arith, &xs, &ys, &eval_at)?)
        } else {
            None
        };

        let xs: Vec<Scalar> = points.iter().map(|p| p.x.clone()).collect();
        let buses = net::build_network(config.n, config.profile);
        let deadline = Duration::from_millis(config.deadline_ms);

        tracing::debug!(n = config.n, profile = ?config.profile, "starting run");

        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for (id, (bus, point)) in buses.into_iter().zip(points.into_iter()).enumerate() {
            let participant = Participant::new(
                id as u16,
                arith.clone(),
                point,
                xs.clone(),
                eval_at.clone(),
                bus,
            );
            tasks.spawn(participant.run());
        }

        let outcome = tokio::time::timeout(deadline, Self::collect(tasks)).await;
        let wall_clock_total = start.elapsed();

        match outcome {
            Err(_elapsed) => {
                tracing::error!(n = config.n, "run exceeded its deadline");
                Ok(RunRecord {
                    participants_n: config.n,
                    network_profile: config.profile,
                    wall_clock_total,
                    compute_ns: 0,
                    network_wait_ns: 0,
                    bytes_sent: 0,
                    bytes_recv: 0,
                    interpolated_value: None,
                    expected_value,
                    ok: false,
                    error_kind: Some(ErrorKind::Timeout),
                })
            }
            Ok(Err(err)) => {
                tracing::error!(n = config.n, error = %err, "a participant failed");
                Ok(RunRecord {
                    participants_n: config.n,
                    network_profile: config.profile,
                    wall_clock_total,
                    compute_ns: 0,
                    network_wait_ns: 0,
                    bytes_sent: 0,
                    bytes_recv: 0,
                    interpolated_value: None,
                    expected_value,
                    ok: false,
                    error_kind: Some(err.kind()),
                })
            }
            Ok(Ok(outcomes)) => {
                let interpolated_value = outcomes.first().map(|o| o.result.clone());
                let agrees = outcomes
                    .iter()
                    .all(|o| Some(&o.result) == interpolated_value.as_ref());
                let matches_expected = expected_value
                    .as_ref()
                    .zip(interpolated_value.as_ref())
                    .map(|(expected, got)| expected == got)
                    .unwrap_or(true);

                let ok = agrees && matches_expected;
                tracing::debug!(n = config.n, ok, ?wall_clock_total, "run completed");
                Ok(RunRecord {
                    participants_n: config.n,
                    network_profile: config.profile,
                    wall_clock_total,
                    compute_ns: outcomes.iter().map(|o| o.compute_ns).sum(),
                    network_wait_ns: outcomes.iter().map(|o| o.network_wait_ns).sum(),
                    bytes_sent: outcomes.iter().map(|o| o.bytes_sent).sum(),
                    bytes_recv: outcomes.iter().map(|o| o.bytes_recv).sum(),
                    interpolated_value,
                    expected_value,
                    ok,
                    error_kind: None,
                })
            }
        }
    }

    /// Waits for every participant task, aborting the rest the moment one
    /// fails so a single bad party doesn't leave the others running past
    /// the point their result still matters.
    async fn collect(
        mut tasks: JoinSet<Result<crate::participant::ParticipantOutcome, ParticipantError>>,
    ) -> Result<Vec<crate::participant::ParticipantOutcome>, ParticipantError> {
        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(err);
                }
                Err(_join_err) => {
                    tasks.abort_all();
                    continue;
                }
            }
        }
        Ok(outcomes)
    }
}

/// Samples a uniformly random degree-`(n-1)` polynomial and evaluates it at
/// `x = 1, .., n`, producing the `n` points a test run hands to its
/// participants.
fn generate_test_points(
    arith: &GroupArith,
    n: u16,
) -> Result<Vec<PrivatePoint>, group_arith::GroupArithError> {
    let mut coefficients = Vec::with_capacity(usize::from(n));
    for _ in 0..n {
        coefficients.push(arith.random_scalar()?);
    }

    let mut points = Vec::with_capacity(usize::from(n));
    for i in 1..=n {
        let x = Scalar::from(u64::from(i));
        let mut y = Scalar::zero();
        let mut power = Scalar::from(1u64);
        for coeff in &coefficients {
            let term = arith.mul_scalar(coeff, &power);
            y = arith.add_scalar(&y, &term);
            power = arith.mul_scalar(&power, &x);
        }
        points.push(PrivatePoint { x, y });
    }
    Ok(points)
}

/// Reference clear-text evaluation used only to cross-check a test run; the
/// protocol itself never gathers every `y_i` in one place like this does.
fn clear_text_interpolate(
    arith: &GroupArith,
    xs: &[Scalar],
    ys: &[Scalar],
    eval_at: &Scalar,
) -> Result<Scalar, group_arith::GroupArithError> {
    let mut total = Scalar::zero();
    for i in 0..xs.len() {
        let lambda_i = group_arith::lagrange_coefficient(arith, xs, i, eval_at)?;
        let term = arith.mul_scalar(&lambda_i, &ys[i]);
        total = arith.add_scalar(&total, &term);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::Integer;

    fn toy_config(n: u16) -> RunConfig {
        RunConfig {
            prime_p: Integer::from(23),
            order_q: Integer::from(11),
            generator_g: Integer::from(2),
            eval_at: Integer::from(0),
            n,
            profile: NetworkProfile::unlimited(1),
            deadline_ms: 5_000,
            test_mode: true,
        }
    }

    #[tokio::test]
    async fn test_mode_run_reconstructs_and_verifies_itself() {
        let record = Coordinator::run(toy_config(5), None).await.unwrap();
        assert!(record.ok);
        assert_eq!(record.interpolated_value, record.expected_value);
    }

    #[tokio::test]
    async fn explicit_toy_vector_reconstructs_f_of_zero_is_three() {
        let points = vec![
            PrivatePoint {
                x: Scalar::from(1u64),
                y: Scalar::from(4u64),
            },
            PrivatePoint {
                x: Scalar::from(2u64),
                y: Scalar::from(5u64),
            },
            PrivatePoint {
                x: Scalar::from(3u64),
                y: Scalar::from(6u64),
            },
        ];
        let mut config = toy_config(3);
        config.test_mode = false;
        let record = Coordinator::run(config, Some(points)).await.unwrap();
        assert!(record.ok);
        assert_eq!(record.interpolated_value, Some(Scalar::from(3u64)));
    }

    #[tokio::test]
    async fn duplicate_abscissas_are_reported_as_not_invertible() {
        let points = vec![
            PrivatePoint {
                x: Scalar::from(1u64),
                y: Scalar::from(4u64),
            },
            PrivatePoint {
                x: Scalar::from(1u64),
                y: Scalar::from(5u64),
            },
            PrivatePoint {
                x: Scalar::from(3u64),
                y: Scalar::from(6u64),
            },
        ];
        let mut config = toy_config(3);
        config.test_mode = false;
        config.deadline_ms = 500;
        let record = Coordinator::run(config, Some(points)).await.unwrap();
        assert!(!record.ok);
        assert_eq!(record.error_kind, Some(ErrorKind::NotInvertible));
    }
}
