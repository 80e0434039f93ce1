//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The handler doesn't care HOW messages are serialized. It holds
//! something that implements [`Codec`] and swaps implementations without
//! touching the room logic. Browser clients read text frames, so the
//! encoded form is a `String`.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that encodes Rust types to text frames and decodes raw frame
/// payloads back.
///
/// `Send + Sync + 'static` because one codec is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame payload back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use tangga_protocol::{ClientAction, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let action: ClientAction = codec.decode(br#"{"type":"roll_dice"}"#).unwrap();
/// assert_eq!(action, ClientAction::RollDice);
///
/// let text = codec.encode(&action).unwrap();
/// assert_eq!(text, r#"{"type":"roll_dice"}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientAction, RoomCode};

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<ClientAction, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_normalizes_room_code() {
        let action: ClientAction = JsonCodec
            .decode(br#"{"type":"join_room","room_code":" ab12 ","player_name":"Rian"}"#)
            .unwrap();
        assert_eq!(
            action,
            ClientAction::JoinRoom {
                room_code: RoomCode::new("AB12"),
                player_name: "Rian".into(),
            }
        );
    }
}
