use rand_core::{OsRng, RngCore};
use rug::Integer;

use crate::errors::{GroupArithError, NotInvertible, RngUnavailable};
use crate::params::{GroupElement, GroupParams, Scalar};

/// Modular arithmetic over a [`GroupParams`]-defined subgroup of `(Z/pZ)*`
///
/// Isolating modular arithmetic behind this surface keeps the cryptographic
/// contract auditable and lets the prime parameters be swapped without
/// touching protocol code.
#[derive(Clone, Debug)]
pub struct GroupArith {
    params: GroupParams,
}

impl GroupArith {
    pub fn new(params: GroupParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    /// Uniform scalar in `[0, q)`, sampled by rejection from the OS RNG
    pub fn random_scalar(&self) -> Result<Scalar, GroupArithError> {
        let q = self.params.q();
        let byte_len = self.params.scalar_byte_len();
        // Mask the top byte down to q's exact bit length so the sampled
        // range is less than 2*q regardless of how q's bits line up with a
        // byte boundary — an extra whole byte of headroom (as opposed to a
        // few bits) makes the acceptance probability collapse for any q
        // whose bit length isn't a multiple of 8.
        let bit_len = q.significant_bits();
        let top_bits = bit_len - 8 * (byte_len as u32 - 1);
        let top_mask = if top_bits >= 8 {
            0xffu8
        } else {
            ((1u16 << top_bits) - 1) as u8
        };

        let mut buf = vec![0u8; byte_len];
        for _ in 0..256 {
            OsRng.try_fill_bytes(&mut buf).map_err(RngUnavailable)?;
            buf[0] &= top_mask;
            let candidate = Integer::from_digits(&buf, rug::integer::Order::Msf);
            if &candidate < q {
                return Ok(Scalar(candidate));
            }
        }
        // Rejection sampling failing 256 times in a row on a well-formed q
        // indicates the RNG itself is degenerate (e.g. always returning 0xff).
        Err(RngUnavailable(rand_core::Error::new(
            "rejection sampling did not converge",
        ))
        .into())
    }

    pub fn add_scalar(&self, a: &Scalar, b: &Scalar) -> Scalar {
        let sum = Integer::from(&a.0 + &b.0);
        Scalar(sum.rem_euc(self.params.q()))
    }

    pub fn sub_scalar(&self, a: &Scalar, b: &Scalar) -> Scalar {
        let diff = Integer::from(&a.0 - &b.0);
        Scalar(diff.rem_euc(self.params.q()))
    }

    pub fn mul_scalar(&self, a: &Scalar, b: &Scalar) -> Scalar {
        let prod = Integer::from(&a.0 * &b.0);
        Scalar(prod.rem_euc(self.params.q()))
    }

    /// Modular inverse via extended Euclidean algorithm (as implemented by
    /// `rug`/GMP). Fails with `NotInvertible` iff `gcd(a, q) != 1`, which for
    /// prime `q` only happens when `a ≡ 0 (mod q)`.
    pub fn inv_scalar(&self, a: &Scalar) -> Result<Scalar, GroupArithError> {
        let a = a.0.clone().rem_euc(self.params.q());
        match a.invert(self.params.q()) {
            Ok(inv) => Ok(Scalar(inv)),
            Err(_) => Err(NotInvertible.into()),
        }
    }

    /// Constant-time execution is not required under the semi-honest model
    pub fn pow(&self, base: &GroupElement, exp: &Scalar) -> GroupElement {
        #[allow(clippy::expect_used)]
        let result = base
            .0
            .pow_mod_ref(&exp.0, self.params.p())
            .map(Integer::from)
            .expect("exponent is reduced mod q >= 0 and p > 0, so pow_mod always succeeds");
        GroupElement(result)
    }
}
