//! On-the-wire framing between participants
//!
//! Frame: a 4-byte big-endian length `L`, then `L` bytes of payload. The
//! payload is a compact tagged record `{type, round, sender_id, value}`; the
//! protocol layer owns everything past that, the transport never inspects
//! `value`'s contents.

use crate::errors::WireError;

/// Tag distinguishing the two message kinds the protocol exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Share = 1,
    Partial = 2,
}

impl MessageKind {
    fn from_tag(tag: u8) -> Result<Self, WireError> {
        match tag {
            1 => Ok(MessageKind::Share),
            2 => Ok(MessageKind::Partial),
            other => Err(WireError::UnknownMessageType(other)),
        }
    }
}

/// A decoded wire payload: `{type, round, sender_id, value}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: MessageKind,
    pub round: u8,
    pub sender_id: u16,
    pub value: Vec<u8>,
}

/// Encodes `frame` as a length-prefixed byte string ready to hand to a
/// [`MessageBus`](crate::MessageBus)
pub fn encode(frame: &Frame) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + frame.value.len());
    payload.push(frame.kind as u8);
    payload.push(frame.round);
    payload.extend_from_slice(&frame.sender_id.to_be_bytes());
    payload.extend_from_slice(&frame.value);

    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Decodes a length-prefixed byte string produced by [`encode`]. `value_len`
/// is the expected width of the `value` field (`GroupParams::scalar_byte_len`);
/// passing the wrong width is treated as a malformed frame rather than
/// silently truncating or padding.
pub fn decode(bytes: &[u8], value_len: usize) -> Result<Frame, WireError> {
    if bytes.len() < 4 {
        return Err(WireError::Truncated);
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[0..4]);
    let declared_len = u32::from_be_bytes(len_bytes) as usize;
    let payload = &bytes[4..];
    if payload.len() != declared_len {
        return Err(WireError::LengthMismatch);
    }
    if payload.len() < 4 + value_len {
        return Err(WireError::Truncated);
    }

    let kind = MessageKind::from_tag(payload[0])?;
    let round = payload[1];
    let sender_id = u16::from_be_bytes([payload[2], payload[3]]);
    let value = payload[4..4 + value_len].to_vec();
    if payload.len() != 4 + value_len {
        return Err(WireError::BadValueLength);
    }

    Ok(Frame {
        kind,
        round,
        sender_id,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_share_frame() {
        let frame = Frame {
            kind: MessageKind::Share,
            round: 1,
            sender_id: 3,
            value: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let bytes = encode(&frame);
        assert_eq!(decode(&bytes, 4).unwrap(), frame);
    }

    #[test]
    fn rejects_unknown_type_tag() {
        let frame = Frame {
            kind: MessageKind::Partial,
            round: 2,
            sender_id: 0,
            value: vec![1, 2, 3, 4],
        };
        let mut bytes = encode(&frame);
        // corrupt the type tag (first payload byte, after the 4-byte length prefix)
        bytes[4] = 0xff;
        assert!(matches!(
            decode(&bytes, 4),
            Err(WireError::UnknownMessageType(0xff))
        ));
    }

    #[test]
    fn rejects_truncated_frame() {
        assert!(matches!(decode(&[0, 0, 0], 4), Err(WireError::Truncated)));
    }

    #[test]
    fn rejects_wrong_value_width() {
        let frame = Frame {
            kind: MessageKind::Share,
            round: 1,
            sender_id: 1,
            value: vec![1, 2, 3, 4],
        };
        let bytes = encode(&frame);
        assert!(matches!(
            decode(&bytes, 8),
            Err(WireError::Truncated) | Err(WireError::BadValueLength)
        ));
    }
}
