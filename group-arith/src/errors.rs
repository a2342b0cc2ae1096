use thiserror::Error;

/// Bulk-implements `From<Src>` for an error wrapper by routing `Src` into one
/// of the wrapper's private `Reason` variants. Saves one hand-written `impl
/// From` block per leaf error kind.
macro_rules! impl_from {
    (impl From for $target:ident {
        $($var:ident: $src:ty => $expr:expr),+ $(,)?
    }) => {
        $(
            impl From<$src> for $target {
                fn from($var: $src) -> Self {
                    $expr
                }
            }
        )+
    };
}
pub(crate) use impl_from;

/// Error returned by a fallible [`GroupArith`](crate::GroupArith) operation
#[derive(Debug, Error)]
#[error("group arithmetic operation failed")]
pub struct GroupArithError(#[source] Reason);

impl_from! {
    impl From for GroupArithError {
        err: RngUnavailable => GroupArithError(Reason::Rng(err)),
        err: NotInvertible => GroupArithError(Reason::NotInvertible(err)),
    }
}

#[derive(Debug, Error)]
enum Reason {
    #[error("OS randomness source is unavailable")]
    Rng(#[source] RngUnavailable),
    #[error("value has no modular inverse")]
    NotInvertible(#[source] NotInvertible),
}

/// Coarse classification of a [`GroupArithError`], for callers that need to
/// branch on cause without matching the private [`Reason`] enum directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupArithErrorKind {
    RngUnavailable,
    NotInvertible,
}

impl GroupArithError {
    pub fn kind(&self) -> GroupArithErrorKind {
        match &self.0 {
            Reason::Rng(_) => GroupArithErrorKind::RngUnavailable,
            Reason::NotInvertible(_) => GroupArithErrorKind::NotInvertible,
        }
    }
}

/// The OS randomness source could not be read
#[derive(Debug, Error)]
#[error("failed to read from OS randomness source")]
pub struct RngUnavailable(#[source] pub(crate) rand_core::Error);

/// `gcd(a, q) != 1`: `a` has no inverse modulo `q`
///
/// Only possible when `q` is not prime or `a` is a multiple of `q`; under
/// valid [`GroupParams`](crate::GroupParams) this indicates a duplicate
/// abscissa was fed into [`lagrange_coefficient`](crate::lagrange_coefficient).
#[derive(Debug, Error, Clone, Copy)]
#[error("gcd(a, q) != 1: value is not invertible modulo q")]
pub struct NotInvertible;

/// Error constructing [`GroupParams`](crate::GroupParams) from untrusted input
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidGroupParams {
    #[error("modulus p is too small to define a cryptographic group")]
    ModulusTooSmall,
    #[error("subgroup order q is too small")]
    OrderTooSmall,
    #[error("generator g must satisfy 1 < g < p")]
    GeneratorOutOfRange,
    #[error("q does not divide p - 1")]
    OrderDoesNotDivideModulus,
    #[error("g^q != 1 (mod p): g does not generate the order-q subgroup")]
    GeneratorNotInSubgroup,
}
