#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Effect`**: A looping or one-shot list of linear color ramps
//! - **`EffectStep`**: Target color + substep count + substep duration
//! - **`EffectPlayer`**: Walks one output through an effect, one substep per tick
//! - **`StreamQueue`**: Bounded FIFO of live stream steps with free-space credit
//! - **`StreamCoordinator`**: Hands a channel between its steady effect and a stream
//! - **`ChannelSet`**: Owns all channels, routes `ChannelMessage`s, drives ticks
//! - **`LedOutput`**: Trait to implement for your LED hardware
//! - **`StreamLink`**: Trait to implement for the wireless link carrying the stream
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Colors are 8-bit `Srgb<u8>` values and all interpolation is integer
//! arithmetic, so ramps land exactly on their target.

#[macro_use]
mod fmt;

pub mod channels;
pub mod colors;
pub mod command;
pub mod coordinator;
pub mod effect;
pub mod player;
pub mod queue;
pub mod time;
pub mod types;

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub use channels::{Channel, ChannelError, ChannelSet};
pub use colors::{BLACK, BLUE, GREEN, RED, WHITE};
pub use command::{ChannelMessage, DecodeError, StreamStepRecord};
pub use coordinator::{
    ChannelId, ChannelMode, Notification, StreamCoordinator, StreamError, StreamLink,
};
pub use effect::{Effect, EffectBuilder};
pub use player::{
    EffectPlayer, LedOutput, OutputError, PlaybackCursor, PlayerError, PlayerState, TickOutcome,
};
pub use queue::StreamQueue;
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use types::{Color, EffectError, EffectStep};

/// Stream queue slots used by the reference firmware.
pub const DEFAULT_STREAM_QUEUE_CAPACITY: usize = 100;
