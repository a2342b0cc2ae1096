//! Prime-order cyclic group arithmetic
//!
//! Exposes modular arithmetic over the order-`q` subgroup of `(Z/pZ)*`
//! behind a small surface ([`GroupArith`]), plus the public Lagrange
//! coefficient used to reconstruct a secret shared across a set of
//! abscissas.

mod arith;
mod errors;
mod lagrange;
mod params;

pub use arith::GroupArith;
pub use errors::{
    GroupArithError, GroupArithErrorKind, InvalidGroupParams, NotInvertible, RngUnavailable,
};
pub use lagrange::lagrange_coefficient;
pub use params::{GroupElement, GroupParams, Scalar};

pub use rug::Integer;
