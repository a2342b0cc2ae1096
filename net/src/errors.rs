use thiserror::Error;

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

/// Error returned by a fallible [`MessageBus`](crate::MessageBus) operation
#[derive(Debug, Error)]
#[error("message bus operation failed")]
pub struct BusError(#[source] Reason);

impl_from! {
    impl From for BusError {
        err: PeerUnreachable => BusError(Reason::PeerUnreachable(err)),
        err: BusClosed => BusError(Reason::BusClosed(err)),
        err: WireError => BusError(Reason::Wire(err)),
    }
}

#[derive(Debug, Error)]
enum Reason {
    #[error("peer connection has been closed")]
    PeerUnreachable(#[source] PeerUnreachable),
    #[error("bus has been shut down")]
    BusClosed(#[source] BusClosed),
    #[error("malformed frame")]
    Wire(#[source] WireError),
}

/// Coarse classification of a [`BusError`], for callers that need to branch
/// on cause without matching the private [`Reason`] enum directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusErrorKind {
    PeerUnreachable,
    BusClosed,
    Wire,
}

impl BusError {
    pub fn kind(&self) -> BusErrorKind {
        match &self.0 {
            Reason::PeerUnreachable(_) => BusErrorKind::PeerUnreachable,
            Reason::BusClosed(_) => BusErrorKind::BusClosed,
            Reason::Wire(_) => BusErrorKind::Wire,
        }
    }
}

/// The target peer's connection has been closed and cannot accept sends
#[derive(Debug, Error, Clone, Copy)]
#[error("peer {0} is unreachable: connection closed")]
pub struct PeerUnreachable(pub u16);

/// The bus has been shut down; `recv` will never yield another message
#[derive(Debug, Error, Clone, Copy)]
#[error("bus has been closed")]
pub struct BusClosed;

/// A frame on the wire did not conform to the expected format
#[derive(Debug, Error, Clone, Copy)]
pub enum WireError {
    #[error("frame shorter than the fixed header")]
    Truncated,
    #[error("declared frame length does not match payload length")]
    LengthMismatch,
    #[error("unrecognized message type tag: {0}")]
    UnknownMessageType(u8),
    #[error("value field length does not match the configured scalar width")]
    BadValueLength,
}
