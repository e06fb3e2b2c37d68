//! Inbound messages and the stream step wire record.

use crate::coordinator::ChannelId;
use crate::effect::Effect;
use crate::time::TimeDuration;
use crate::types::Color;

/// Messages routed to a channel set.
#[derive(Debug, Clone)]
pub enum ChannelMessage<D: TimeDuration, const N: usize> {
    /// Assign a steady effect, or stream every step of `effect` when `is_stream` is set.
    SetEffect {
        channel_id: ChannelId,
        effect: Effect<D, N>,
        is_stream: bool,
    },
    /// Append one step to the channel's stream.
    EnqueueStreamStep {
        channel_id: ChannelId,
        color: Color,
        substep_count: u16,
        /// Milliseconds per substep.
        substep_duration: u16,
    },
    /// Abort the channel's stream.
    StopStream { channel_id: ChannelId },
    /// Ask for a free-space report.
    QueryFreeSpace { channel_id: ChannelId },
}

impl<D: TimeDuration, const N: usize> ChannelMessage<D, N> {
    /// Returns the channel this message targets.
    pub fn channel_id(&self) -> ChannelId {
        match self {
            ChannelMessage::SetEffect { channel_id, .. }
            | ChannelMessage::EnqueueStreamStep { channel_id, .. }
            | ChannelMessage::StopStream { channel_id }
            | ChannelMessage::QueryFreeSpace { channel_id } => *channel_id,
        }
    }
}

/// Wire record decoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload has the wrong length or an invalid field.
    MalformedStepPayload,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::MalformedStepPayload => write!(f, "malformed stream step payload"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// One stream step as sent over the configuration channel.
///
/// Layout: red, green, blue, substep count (u16 LE), substep duration in
/// milliseconds (u16 LE), one reserved byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamStepRecord {
    pub color: Color,
    pub substep_count: u16,
    pub substep_duration: u16,
}

impl StreamStepRecord {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Decodes a record.
    ///
    /// # Errors
    /// * `MalformedStepPayload` - wrong length or zero substep count
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let bytes: &[u8; Self::SIZE] = bytes
            .try_into()
            .map_err(|_| DecodeError::MalformedStepPayload)?;

        let substep_count = u16::from_le_bytes([bytes[3], bytes[4]]);
        if substep_count == 0 {
            return Err(DecodeError::MalformedStepPayload);
        }

        Ok(Self {
            color: Color::new(bytes[0], bytes[1], bytes[2]),
            substep_count,
            substep_duration: u16::from_le_bytes([bytes[5], bytes[6]]),
        })
    }

    /// Wraps the record in a message for `channel_id`.
    pub fn into_message<D: TimeDuration, const N: usize>(
        self,
        channel_id: ChannelId,
    ) -> ChannelMessage<D, N> {
        ChannelMessage::EnqueueStreamStep {
            channel_id,
            color: self.color,
            substep_count: self.substep_count,
            substep_duration: self.substep_duration,
        }
    }
}
