//! Hand-off between a channel's steady effect and a live stream.
//!
//! [`StreamCoordinator`] owns the per-channel mode. While a stream plays, the
//! steady effect is parked and any steady update is buffered; once the stream
//! queue runs dry the channel passes through `Draining` back to `Steady` and
//! the parked effect restarts from its first step.

use crate::effect::Effect;
use crate::player::{EffectPlayer, LedOutput, PlayerError, PlayerState};
use crate::queue::StreamQueue;
use crate::time::TimeDuration;
use crate::types::{EffectError, EffectStep};

/// An identifier for an output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub usize);

impl From<usize> for ChannelId {
    fn from(id: usize) -> Self {
        ChannelId(id)
    }
}

impl From<ChannelId> for usize {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

/// Ownership mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    /// Outputs not started yet, or suspended. Steady effects are stored only.
    Uninitialized,
    /// Playing the steady effect.
    Steady,
    /// Playing stream steps from the queue.
    Streaming,
    /// Stream ran dry, steady effect being restored.
    Draining,
}

/// Outbound flow-control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// A stream step finished playing and its slot is free again.
    ReadyForNextStep { channel_id: ChannelId },
    /// Answer to a free-space query.
    FreeSpaceReport { channel_id: ChannelId, free_slots: u8 },
}

/// Trait for the wireless link carrying the stream.
pub trait StreamLink {
    /// Sends a flow-control message to the producer.
    fn notify(&mut self, notification: Notification);

    /// Switches the connection between low latency (streaming) and its default.
    fn set_low_latency(&mut self, low_latency: bool);

    /// Called on every channel mode transition. Defaults to doing nothing.
    fn mode_changed(&mut self, _channel_id: ChannelId, _mode: ChannelMode) {}
}

/// Errors raised by stream hand-off operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError {
    /// Channel outputs are not started.
    NotStarted,
    /// Stream queue full, the incoming step was dropped.
    QueueFull,
    /// A stream step could not be wrapped into an effect.
    Effect(EffectError),
    /// The player rejected the operation.
    Player(PlayerError),
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StreamError::NotStarted => write!(f, "channel outputs are not started"),
            StreamError::QueueFull => write!(f, "stream queue full, step dropped"),
            StreamError::Effect(err) => write!(f, "invalid stream step: {}", err),
            StreamError::Player(err) => write!(f, "player error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StreamError {}

impl From<EffectError> for StreamError {
    fn from(err: EffectError) -> Self {
        StreamError::Effect(err)
    }
}

impl From<PlayerError> for StreamError {
    fn from(err: PlayerError) -> Self {
        StreamError::Player(err)
    }
}

/// Per-channel stream state machine.
///
/// Operates on the channel's player and queue, which are passed in by the
/// owner. Every operation that (re)starts playback returns the delay until the
/// player's first tick; `None` means the tick schedule is unchanged unless the
/// player stopped playing.
#[derive(Debug, Clone)]
pub struct StreamCoordinator<D: TimeDuration, const N: usize> {
    channel_id: ChannelId,
    mode: ChannelMode,
    steady: Option<Effect<D, N>>,
    pending_steady: Option<Effect<D, N>>,
}

impl<D: TimeDuration, const N: usize> StreamCoordinator<D, N> {
    /// Creates a coordinator for an `Uninitialized` channel with no steady effect.
    pub fn new(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            mode: ChannelMode::Uninitialized,
            steady: None,
            pending_steady: None,
        }
    }

    /// Assigns the steady effect.
    ///
    /// Plays it immediately in `Steady` mode, stores it in `Uninitialized`
    /// mode, and buffers it (last write wins) while a stream owns the channel.
    /// A faulted player keeps the new effect stored for its recovery.
    pub fn assign_steady<L: LedOutput>(
        &mut self,
        effect: Effect<D, N>,
        player: &mut EffectPlayer<D, L, N>,
    ) -> Result<Option<D>, StreamError> {
        match self.mode {
            ChannelMode::Uninitialized => {
                self.steady = Some(effect);
                Ok(None)
            }
            ChannelMode::Steady => {
                self.steady = Some(effect.clone());
                if player.state() == PlayerState::Faulted {
                    warn!("channel {}: output faulted, steady effect stored", self.channel_id.0);
                    return Ok(None);
                }
                Ok(Some(player.set_effect(effect)?))
            }
            ChannelMode::Streaming | ChannelMode::Draining => {
                debug!("channel {}: steady effect buffered until stream ends", self.channel_id.0);
                self.pending_steady = Some(effect);
                Ok(None)
            }
        }
    }

    /// Leaves `Uninitialized` and plays the stored steady effect, if any.
    pub fn start<L: LedOutput, K: StreamLink>(
        &mut self,
        player: &mut EffectPlayer<D, L, N>,
        link: &mut K,
    ) -> Result<Option<D>, StreamError> {
        if self.mode != ChannelMode::Uninitialized {
            return Ok(None);
        }

        self.set_mode(ChannelMode::Steady, link);
        match self.steady.clone() {
            Some(effect) => Ok(Some(player.set_effect(effect)?)),
            None => Ok(None),
        }
    }

    /// Returns to `Uninitialized` and turns the output off.
    ///
    /// An active stream is abandoned: its queue is discarded and the link
    /// returns to default latency. A buffered steady update becomes the steady
    /// effect that plays on the next start.
    pub fn suspend<L: LedOutput, K: StreamLink, const C: usize>(
        &mut self,
        player: &mut EffectPlayer<D, L, N>,
        queue: &mut StreamQueue<D, C>,
        link: &mut K,
    ) -> Result<(), StreamError> {
        if matches!(self.mode, ChannelMode::Streaming | ChannelMode::Draining) {
            queue.clear();
            link.set_low_latency(false);
        }
        if let Some(effect) = self.pending_steady.take() {
            self.steady = Some(effect);
        }

        self.set_mode(ChannelMode::Uninitialized, link);
        player.stop()?;
        Ok(())
    }

    /// Accepts one stream step.
    ///
    /// The first step of a stream takes the channel over: the steady effect is
    /// parked, the link is asked for low latency and the step starts playing at
    /// once. Later steps are queued; when the queue is full the incoming step is
    /// dropped and the queued ones are kept.
    pub fn enqueue_streamed_step<L: LedOutput, K: StreamLink, const C: usize>(
        &mut self,
        step: EffectStep<D>,
        player: &mut EffectPlayer<D, L, N>,
        queue: &mut StreamQueue<D, C>,
        link: &mut K,
    ) -> Result<Option<D>, StreamError> {
        match self.mode {
            ChannelMode::Uninitialized => {
                warn!("channel {}: stream step before outputs started, dropped", self.channel_id.0);
                Err(StreamError::NotStarted)
            }
            ChannelMode::Steady => {
                if !queue.try_enqueue(step) {
                    warn!("channel {}: stream queue full, step dropped", self.channel_id.0);
                    return Err(StreamError::QueueFull);
                }

                self.set_mode(ChannelMode::Streaming, link);
                link.set_low_latency(true);
                info!("channel {}: stream started", self.channel_id.0);

                match self.play_next(player, queue) {
                    Ok(delay) => Ok(delay),
                    Err(err) => {
                        error!("channel {}: stream start failed, rolling back", self.channel_id.0);
                        queue.clear();
                        link.set_low_latency(false);
                        self.set_mode(ChannelMode::Steady, link);
                        Err(err)
                    }
                }
            }
            ChannelMode::Streaming | ChannelMode::Draining => {
                if !queue.try_enqueue(step) {
                    warn!(
                        "channel {}: stream queue full ({} queued), step dropped",
                        self.channel_id.0,
                        queue.occupied()
                    );
                    return Err(StreamError::QueueFull);
                }
                Ok(None)
            }
        }
    }

    /// Reacts to the player finishing a one-shot effect.
    ///
    /// Outside `Streaming` this is a steady effect ending and nothing happens.
    /// While streaming, the next queued step plays; with the queue empty the
    /// channel enters `Draining`, signals readiness, and the steady effect is
    /// restored.
    pub fn on_effect_finished<L: LedOutput, K: StreamLink, const C: usize>(
        &mut self,
        player: &mut EffectPlayer<D, L, N>,
        queue: &mut StreamQueue<D, C>,
        link: &mut K,
    ) -> Result<Option<D>, StreamError> {
        if self.mode != ChannelMode::Streaming {
            return Ok(None);
        }

        let ready = Notification::ReadyForNextStep {
            channel_id: self.channel_id,
        };

        match self.play_next(player, queue)? {
            Some(delay) => {
                link.notify(ready);
                Ok(Some(delay))
            }
            None => {
                self.set_mode(ChannelMode::Draining, link);
                info!("channel {}: stream drained", self.channel_id.0);
                link.notify(ready);
                self.restore_steady(player, link)
            }
        }
    }

    /// Aborts the stream mid-step and restores the steady effect.
    ///
    /// Queued steps are discarded. Does nothing unless a stream owns the channel.
    pub fn force_stop<L: LedOutput, K: StreamLink, const C: usize>(
        &mut self,
        player: &mut EffectPlayer<D, L, N>,
        queue: &mut StreamQueue<D, C>,
        link: &mut K,
    ) -> Result<Option<D>, StreamError> {
        if !matches!(self.mode, ChannelMode::Streaming | ChannelMode::Draining) {
            debug!("channel {}: stop requested with no active stream", self.channel_id.0);
            return Ok(None);
        }

        info!(
            "channel {}: stream stopped, {} queued steps discarded",
            self.channel_id.0,
            queue.occupied()
        );
        queue.clear();
        self.restore_steady(player, link)
    }

    /// Reports the queue's free space to the producer.
    pub fn report_free_space<K: StreamLink, const C: usize>(
        &self,
        queue: &StreamQueue<D, C>,
        link: &mut K,
    ) {
        let free_slots = u8::try_from(queue.free_space()).unwrap_or(u8::MAX);
        link.notify(Notification::FreeSpaceReport {
            channel_id: self.channel_id,
            free_slots,
        });
    }

    /// Starts the queue head as a single-step effect.
    ///
    /// Returns `Ok(None)` when the queue is empty.
    fn play_next<L: LedOutput, const C: usize>(
        &mut self,
        player: &mut EffectPlayer<D, L, N>,
        queue: &mut StreamQueue<D, C>,
    ) -> Result<Option<D>, StreamError> {
        let Some(step) = queue.try_dequeue() else {
            return Ok(None);
        };

        let effect = Effect::single(step)?;
        Ok(Some(player.set_effect(effect)?))
    }

    fn restore_steady<L: LedOutput, K: StreamLink>(
        &mut self,
        player: &mut EffectPlayer<D, L, N>,
        link: &mut K,
    ) -> Result<Option<D>, StreamError> {
        if let Some(effect) = self.pending_steady.take() {
            self.steady = Some(effect);
        }

        link.set_low_latency(false);
        let result = match self.steady.clone() {
            Some(effect) => player.set_effect(effect).map(Some).map_err(StreamError::from),
            None => {
                player.clear();
                Ok(None)
            }
        };

        self.set_mode(ChannelMode::Steady, link);
        result
    }

    fn set_mode<K: StreamLink>(&mut self, mode: ChannelMode, link: &mut K) {
        self.mode = mode;
        link.mode_changed(self.channel_id, mode);
    }

    /// Returns the ID of the channel this coordinator drives.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Returns the current ownership mode.
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Returns the steady effect parked or playing on this channel.
    pub fn steady_effect(&self) -> Option<&Effect<D, N>> {
        self.steady.as_ref()
    }

    /// Returns the steady update buffered during a stream, if any.
    pub fn pending_steady_effect(&self) -> Option<&Effect<D, N>> {
        self.pending_steady.as_ref()
    }
}
