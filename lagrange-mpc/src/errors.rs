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

/// A single participant's run failed
#[derive(Debug, Error)]
#[error("participant failed")]
pub struct ParticipantError(#[source] Reason);

impl_from! {
    impl From for ParticipantError {
        err: group_arith::GroupArithError => ParticipantError(Reason::Arith(err)),
        err: net::BusError => ParticipantError(Reason::Bus(err)),
        err: ProtocolViolation => ParticipantError(Reason::ProtocolViolation(err)),
    }
}

impl ParticipantError {
    /// Coarse classification used to populate `RunRecord::error_kind`
    /// without exposing the full `thiserror` chain outside this crate.
    pub fn kind(&self) -> ErrorKind {
        match &self.0 {
            Reason::Arith(err) => arith_error_kind(err),
            Reason::Bus(err) => bus_error_kind(err),
            Reason::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
        }
    }
}

#[derive(Debug, Error)]
enum Reason {
    #[error("group arithmetic failed")]
    Arith(#[source] group_arith::GroupArithError),
    #[error("transport error")]
    Bus(#[source] net::BusError),
    #[error("protocol violation")]
    ProtocolViolation(#[source] ProtocolViolation),
}

/// A peer sent something that doesn't fit the two-round protocol this crate
/// runs: an unexpected round number, a message type it shouldn't be sending
/// yet, a frame that doesn't parse, or a sender the recipient already heard
/// from this round.
#[derive(Debug, Error, Clone)]
pub enum ProtocolViolation {
    #[error("received duplicate {kind} message from party {from}")]
    DuplicateSender { kind: &'static str, from: u16 },
    #[error("received a frame from party {from} that doesn't parse: {source}")]
    MalformedFrame {
        from: u16,
        #[source]
        source: net::WireError,
    },
    #[error("received a message of the wrong kind or round from party {from}")]
    UnexpectedMessage { from: u16 },
}

/// Top-level failure of an entire run, surfaced by [`Coordinator::run`](crate::coordinator::Coordinator::run)
#[derive(Debug, Error)]
#[error("protocol run failed")]
pub struct RunError(#[source] RunReason);

impl_from! {
    impl From for RunError {
        err: ParticipantError => RunError(RunReason::Participant(err)),
        err: group_arith::InvalidGroupParams => RunError(RunReason::InvalidGroupParams(err)),
    }
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match &self.0 {
            RunReason::Participant(err) => err.kind(),
            RunReason::InvalidGroupParams(_) => ErrorKind::InvalidGroupParams,
            RunReason::MissingInputs => ErrorKind::MissingInputs,
        }
    }

    pub(crate) fn missing_inputs() -> Self {
        RunError(RunReason::MissingInputs)
    }
}

#[derive(Debug, Error)]
enum RunReason {
    #[error("a participant failed")]
    Participant(#[source] ParticipantError),
    #[error("invalid group parameters")]
    InvalidGroupParams(#[source] group_arith::InvalidGroupParams),
    #[error("test_mode is false but no inputs were supplied")]
    MissingInputs,
}

/// Coarse error classification recorded in `RunRecord::error_kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    RngUnavailable,
    NotInvertible,
    PeerUnreachable,
    BusClosed,
    ProtocolViolation,
    Timeout,
    InvalidGroupParams,
    MissingInputs,
}

fn arith_error_kind(err: &group_arith::GroupArithError) -> ErrorKind {
    match err.kind() {
        group_arith::GroupArithErrorKind::RngUnavailable => ErrorKind::RngUnavailable,
        group_arith::GroupArithErrorKind::NotInvertible => ErrorKind::NotInvertible,
    }
}

fn bus_error_kind(err: &net::BusError) -> ErrorKind {
    match err.kind() {
        net::BusErrorKind::PeerUnreachable => ErrorKind::PeerUnreachable,
        net::BusErrorKind::BusClosed => ErrorKind::BusClosed,
        net::BusErrorKind::Wire => ErrorKind::ProtocolViolation,
    }
}
