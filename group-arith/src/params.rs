use rug::Integer;
use serde::{Deserialize, Serialize};

use crate::errors::InvalidGroupParams;

/// Parameters of the order-`q` subgroup of `(Z/pZ)*` generated by `g`.
///
/// `GroupParams::new` checks the invariant `g^q ≡ 1 (mod p)` and that `q`
/// divides `p - 1`, but does not verify that `q` is minimal (i.e. that no
/// smaller `k` also satisfies `g^k ≡ 1`) — doing so would require factoring
/// `q`, impractical for the 1024-3072 bit primes this crate targets. Callers
/// must supply `q` from a trusted source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupParams {
    p: Integer,
    q: Integer,
    g: Integer,
    scalar_byte_len: usize,
}

impl GroupParams {
    pub fn new(p: Integer, q: Integer, g: Integer) -> Result<Self, InvalidGroupParams> {
        if p < 5 {
            return Err(InvalidGroupParams::ModulusTooSmall);
        }
        if q < 3 {
            return Err(InvalidGroupParams::OrderTooSmall);
        }
        if g <= 1 || g >= p {
            return Err(InvalidGroupParams::GeneratorOutOfRange);
        }

        let p_minus_one = Integer::from(&p - 1);
        if Integer::from(&p_minus_one % &q) != 0 {
            return Err(InvalidGroupParams::OrderDoesNotDivideModulus);
        }

        let g_pow_q = g
            .pow_mod_ref(&q, &p)
            .map(Integer::from)
            .ok_or(InvalidGroupParams::GeneratorNotInSubgroup)?;
        if g_pow_q != 1 {
            return Err(InvalidGroupParams::GeneratorNotInSubgroup);
        }

        let scalar_byte_len = q.significant_bits().div_ceil(8) as usize;

        Ok(Self {
            p,
            q,
            g,
            scalar_byte_len,
        })
    }

    pub fn p(&self) -> &Integer {
        &self.p
    }

    pub fn q(&self) -> &Integer {
        &self.q
    }

    pub fn g(&self) -> &Integer {
        &self.g
    }

    /// Length, in bytes, of a big-endian-encoded [`Scalar`](crate::Scalar) —
    /// `ceil(log2(q) / 8)`, matching the wire format's `value` field width.
    pub fn scalar_byte_len(&self) -> usize {
        self.scalar_byte_len
    }
}

/// A member of the order-`q` subgroup: an integer in `[1, p-1]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupElement(pub(crate) Integer);

impl GroupElement {
    pub fn as_integer(&self) -> &Integer {
        &self.0
    }
}

impl From<GroupElement> for Integer {
    fn from(e: GroupElement) -> Self {
        e.0
    }
}

/// An element of the exponent domain: an integer in `[0, q-1]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scalar(pub(crate) Integer);

impl Scalar {
    pub fn zero() -> Self {
        Scalar(Integer::new())
    }

    pub fn as_integer(&self) -> &Integer {
        &self.0
    }

    pub fn from_integer_mod_q(value: Integer, params: &GroupParams) -> Self {
        Scalar(Integer::from(value.rem_euc(params.q())))
    }

    /// Big-endian encoding, zero-padded to [`GroupParams::scalar_byte_len`]
    pub fn to_be_bytes(&self, params: &GroupParams) -> Vec<u8> {
        let mut bytes = self.0.to_digits::<u8>(rug::integer::Order::Msf);
        let width = params.scalar_byte_len();
        if bytes.len() < width {
            let mut padded = vec![0u8; width - bytes.len()];
            padded.append(&mut bytes);
            padded
        } else {
            bytes
        }
    }

    pub fn from_be_bytes(bytes: &[u8], params: &GroupParams) -> Self {
        let value = Integer::from_digits(bytes, rug::integer::Order::Msf);
        Self::from_integer_mod_q(value, params)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar(Integer::from(value))
    }
}
