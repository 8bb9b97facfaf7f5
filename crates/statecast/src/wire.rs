//! Frame helpers for hosts that bridge sessions onto their own medium.

use statecast_core::{decode, decode_frame, Message};

use crate::error::Result;

/// Decode and validate a received frame in one step.
///
/// Fails with [`StatecastError::Protocol`](crate::StatecastError::Protocol)
/// when the frame is not JSON or not a well-formed message.
pub fn decode_message(frame: &[u8]) -> Result<Message> {
    let value = decode_frame(frame)?;
    let message = decode(&value)?;
    tracing::trace!(kind = %message.message_type(), "decoded frame");
    Ok(message)
}
