use crate::command::ChannelMessage;
use crate::coordinator::{ChannelId, ChannelMode, StreamCoordinator, StreamError, StreamLink};
use crate::effect::Effect;
use crate::player::{EffectPlayer, LedOutput, PlayerState, TickOutcome};
use crate::queue::StreamQueue;
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::{Color, EffectError, EffectStep};

/// Errors that can occur during channel set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// The specified channel does not exist.
    InvalidChannelId(ChannelId),

    /// The message carried an invalid effect or step.
    Effect(EffectError),

    /// A stream hand-off operation failed.
    Stream(StreamError),
}

impl core::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChannelError::InvalidChannelId(id) => {
                write!(f, "channel {} does not exist", id.0)
            }
            ChannelError::Effect(err) => {
                write!(f, "invalid effect: {}", err)
            }
            ChannelError::Stream(err) => {
                write!(f, "stream error: {}", err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChannelError {}

impl From<EffectError> for ChannelError {
    fn from(err: EffectError) -> Self {
        ChannelError::Effect(err)
    }
}

impl From<StreamError> for ChannelError {
    fn from(err: StreamError) -> Self {
        ChannelError::Stream(err)
    }
}

/// One physical output with its player, stream queue and coordinator.
///
/// # Type Parameters
/// * `I` - Time instant type
/// * `L` - Output implementation type
/// * `N` - Maximum number of steps in effects
/// * `C` - Stream queue slots
pub struct Channel<I: TimeInstant, L: LedOutput, const N: usize, const C: usize> {
    player: EffectPlayer<I::Duration, L, N>,
    queue: StreamQueue<I::Duration, C>,
    coordinator: StreamCoordinator<I::Duration, N>,
    next_wake: Option<I>,
}

impl<I: TimeInstant, L: LedOutput, const N: usize, const C: usize> Channel<I, L, N, C> {
    fn new(id: ChannelId, output: L) -> Self {
        Self {
            player: EffectPlayer::new(output),
            queue: StreamQueue::new(),
            coordinator: StreamCoordinator::new(id),
            next_wake: None,
        }
    }

    /// Returns the channel's ID.
    pub fn id(&self) -> ChannelId {
        self.coordinator.channel_id()
    }

    /// Returns the channel's ownership mode.
    pub fn mode(&self) -> ChannelMode {
        self.coordinator.mode()
    }

    /// Returns the channel's effect player.
    pub fn player(&self) -> &EffectPlayer<I::Duration, L, N> {
        &self.player
    }

    /// Returns the channel's stream queue.
    pub fn queue(&self) -> &StreamQueue<I::Duration, C> {
        &self.queue
    }

    /// Returns the channel's stream coordinator.
    pub fn coordinator(&self) -> &StreamCoordinator<I::Duration, N> {
        &self.coordinator
    }

    /// Instant of the next scheduled tick, if any.
    pub fn next_wake(&self) -> Option<I> {
        self.next_wake
    }

    fn tick<K: StreamLink>(&mut self, now: I, link: &mut K) {
        match self.player.on_tick() {
            Ok(TickOutcome::Continue(delay)) => self.schedule(now, delay),
            Ok(TickOutcome::Finished) => {
                self.next_wake = None;
                let result = self.coordinator.on_effect_finished(
                    &mut self.player,
                    &mut self.queue,
                    link,
                );
                if let Err(err) = self.apply(now, result) {
                    error!("channel {}: stream hand-off failed: {:?}", self.id().0, err);
                }
            }
            Err(_) => {
                self.next_wake = None;
                error!("channel {}: output write failed, channel faulted", self.id().0);
            }
        }
    }

    /// Rearms or cancels the tick schedule after a coordinator operation.
    fn apply(
        &mut self,
        now: I,
        result: Result<Option<I::Duration>, StreamError>,
    ) -> Result<(), StreamError> {
        match result {
            Ok(Some(delay)) => self.schedule(now, delay),
            Ok(None) if !self.player.is_playing() => self.next_wake = None,
            Ok(None) => {}
            Err(err) => {
                if !self.player.is_playing() {
                    self.next_wake = None;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn schedule(&mut self, now: I, delay: I::Duration) {
        // Overflow falls back to an immediate tick rather than stalling the channel.
        self.next_wake = Some(now.checked_add(delay).unwrap_or(now));
    }
}

/// Owns every output channel and routes messages to them.
///
/// Channels are created once, indexed by [`ChannelId`], and never shared:
/// each holds its own player, stream queue and coordinator. The set drives
/// their variable-period ticks from a single time source; call
/// [`ChannelSet::service`] when the returned delay elapses or after handling a
/// message.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `L` - Output implementation type (same for all channels)
/// * `K` - Stream link implementation type
/// * `N` - Maximum number of steps in effects
/// * `C` - Stream queue slots per channel
/// * `CHANNELS` - Number of channels
pub struct ChannelSet<
    't,
    I: TimeInstant,
    T: TimeSource<I>,
    L: LedOutput,
    K: StreamLink,
    const N: usize,
    const C: usize,
    const CHANNELS: usize,
> {
    channels: [Channel<I, L, N, C>; CHANNELS],
    link: K,
    time_source: &'t T,
}

impl<'t, I, T, L, K, const N: usize, const C: usize, const CHANNELS: usize>
    ChannelSet<'t, I, T, L, K, N, C, CHANNELS>
where
    I: TimeInstant,
    T: TimeSource<I>,
    L: LedOutput,
    K: StreamLink,
{
    /// Creates the channel set. Channel `i` drives `outputs[i]`.
    ///
    /// All channels start `Uninitialized`; steady effects assigned before
    /// [`start`](Self::start) are stored and played once started.
    pub fn new(outputs: [L; CHANNELS], link: K, time_source: &'t T) -> Self {
        let mut index = 0;
        let channels = outputs.map(|output| {
            let channel = Channel::new(ChannelId(index), output);
            index += 1;
            channel
        });

        Self {
            channels,
            link,
            time_source,
        }
    }

    /// Starts every uninitialized channel and plays its stored steady effect.
    pub fn start(&mut self) -> Result<(), ChannelError> {
        let now = self.time_source.now();
        let mut first_error = None;

        for channel in &mut self.channels {
            let result = channel
                .coordinator
                .start(&mut channel.player, &mut self.link);
            if let Err(err) = channel.apply(now, result) {
                error!("channel {}: start failed", channel.id().0);
                first_error = first_error.or(Some(ChannelError::Stream(err)));
            }
        }

        info!("{} channels started", CHANNELS);
        first_error.map_or(Ok(()), Err)
    }

    /// Turns every output off and returns the channels to `Uninitialized`.
    ///
    /// Active streams are abandoned. Steady effects are kept and play again on
    /// the next [`start`](Self::start).
    pub fn suspend(&mut self) -> Result<(), ChannelError> {
        let mut first_error = None;

        for channel in &mut self.channels {
            channel.next_wake = None;
            if let Err(err) =
                channel
                    .coordinator
                    .suspend(&mut channel.player, &mut channel.queue, &mut self.link)
            {
                error!("channel {}: suspend failed", channel.id().0);
                first_error = first_error.or(Some(ChannelError::Stream(err)));
            }
        }

        info!("{} channels suspended", CHANNELS);
        first_error.map_or(Ok(()), Err)
    }

    /// Routes an inbound message to its channel.
    pub fn handle_message(
        &mut self,
        message: ChannelMessage<I::Duration, N>,
    ) -> Result<(), ChannelError> {
        match message {
            ChannelMessage::SetEffect {
                channel_id,
                effect,
                is_stream,
            } => self.set_effect(channel_id, effect, is_stream),
            ChannelMessage::EnqueueStreamStep {
                channel_id,
                color,
                substep_count,
                substep_duration,
            } => {
                let duration = I::Duration::from_millis(u64::from(substep_duration));
                self.enqueue_stream_step(channel_id, color, substep_count, duration)
            }
            ChannelMessage::StopStream { channel_id } => self.stop_stream(channel_id),
            ChannelMessage::QueryFreeSpace { channel_id } => self.query_free_space(channel_id),
        }
    }

    /// Assigns a steady effect, or streams each of its steps in order.
    ///
    /// Streamed steps that do not fit in the queue are dropped; the first such
    /// drop is reported after the remaining steps were offered. A channel that
    /// cannot take the stream over at all stops at the first step.
    pub fn set_effect(
        &mut self,
        id: ChannelId,
        effect: Effect<I::Duration, N>,
        is_stream: bool,
    ) -> Result<(), ChannelError> {
        let now = self.time_source.now();
        let idx = Self::index(id)?;
        let channel = &mut self.channels[idx];

        if !is_stream {
            let result = channel.coordinator.assign_steady(effect, &mut channel.player);
            return Ok(channel.apply(now, result)?);
        }

        let mut first_error = None;
        for step in effect.steps() {
            let result = channel.coordinator.enqueue_streamed_step(
                *step,
                &mut channel.player,
                &mut channel.queue,
                &mut self.link,
            );
            if let Err(err) = channel.apply(now, result) {
                if matches!(err, StreamError::NotStarted | StreamError::Player(_)) {
                    return Err(err.into());
                }
                first_error = first_error.or(Some(err));
            }
        }

        first_error.map_or(Ok(()), |err| Err(err.into()))
    }

    /// Appends one step to a channel's stream, taking the channel over if idle.
    pub fn enqueue_stream_step(
        &mut self,
        id: ChannelId,
        color: Color,
        substep_count: u16,
        substep_duration: I::Duration,
    ) -> Result<(), ChannelError> {
        let step = EffectStep::new(color, substep_count, substep_duration)?;
        let now = self.time_source.now();
        let idx = Self::index(id)?;
        let channel = &mut self.channels[idx];

        let result = channel.coordinator.enqueue_streamed_step(
            step,
            &mut channel.player,
            &mut channel.queue,
            &mut self.link,
        );
        Ok(channel.apply(now, result)?)
    }

    /// Aborts a channel's stream and restores its steady effect.
    pub fn stop_stream(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        let now = self.time_source.now();
        let idx = Self::index(id)?;
        let channel = &mut self.channels[idx];

        let result =
            channel
                .coordinator
                .force_stop(&mut channel.player, &mut channel.queue, &mut self.link);
        Ok(channel.apply(now, result)?)
    }

    /// Sends a free-space report for a channel's stream queue.
    pub fn query_free_space(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        let idx = Self::index(id)?;
        let channel = &self.channels[idx];

        channel
            .coordinator
            .report_free_space(&channel.queue, &mut self.link);
        Ok(())
    }

    /// Clears an output fault and puts the channel back in `Steady` mode.
    ///
    /// A stream that was active when the fault hit is abandoned.
    pub fn recover(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        let now = self.time_source.now();
        let idx = Self::index(id)?;
        let channel = &mut self.channels[idx];

        if channel.player.state() != PlayerState::Faulted {
            return Ok(());
        }

        info!("channel {}: recovering from output fault", id.0);
        channel.player.recover();

        let result = match channel.coordinator.mode() {
            ChannelMode::Streaming | ChannelMode::Draining => channel.coordinator.force_stop(
                &mut channel.player,
                &mut channel.queue,
                &mut self.link,
            ),
            ChannelMode::Steady => match channel.coordinator.steady_effect().cloned() {
                Some(effect) => channel
                    .coordinator
                    .assign_steady(effect, &mut channel.player),
                None => Ok(None),
            },
            ChannelMode::Uninitialized => Ok(None),
        };
        Ok(channel.apply(now, result)?)
    }

    /// Ticks every channel that is due and returns the time until the next one.
    ///
    /// Output faults are channel-local: a faulted channel stops ticking and is
    /// logged, the others keep running.
    ///
    /// # Returns
    /// * `Some(Duration::ZERO)` - A channel is already due again; service immediately
    /// * `Some(duration)` - Sleep this long before the next service call
    /// * `None` - No channel is scheduled; wait for the next message
    pub fn service(&mut self) -> Option<I::Duration> {
        let now = self.time_source.now();
        let mut min_duration: Option<I::Duration> = None;

        for channel in &mut self.channels {
            if channel.next_wake.is_some_and(|due| due <= now) {
                channel.tick(now, &mut self.link);
            }

            if let Some(due) = channel.next_wake {
                let remaining = if due <= now {
                    I::Duration::ZERO
                } else {
                    due.duration_since(now)
                };

                min_duration = match min_duration {
                    Some(current) if current.as_millis() <= remaining.as_millis() => Some(current),
                    _ => Some(remaining),
                };
            }
        }

        min_duration
    }

    /// Returns the channel with the given ID.
    pub fn channel(&self, id: ChannelId) -> Result<&Channel<I, L, N, C>, ChannelError> {
        Ok(&self.channels[Self::index(id)?])
    }

    /// Returns the ownership mode of the specified channel.
    pub fn mode(&self, id: ChannelId) -> Result<ChannelMode, ChannelError> {
        Ok(self.channel(id)?.mode())
    }

    /// Returns the current color being displayed on the specified channel.
    pub fn current_color(&self, id: ChannelId) -> Result<Color, ChannelError> {
        Ok(self.channel(id)?.player.current_color())
    }

    /// Returns the free stream queue slots of the specified channel.
    pub fn free_space(&self, id: ChannelId) -> Result<u32, ChannelError> {
        Ok(self.channel(id)?.queue.free_space())
    }

    /// Returns true if the channel's output failed and it stopped ticking.
    pub fn is_faulted(&self, id: ChannelId) -> Result<bool, ChannelError> {
        Ok(self.channel(id)?.player.state() == PlayerState::Faulted)
    }

    /// Returns the output of the specified channel mutably.
    pub fn output_mut(&mut self, id: ChannelId) -> Result<&mut L, ChannelError> {
        let idx = Self::index(id)?;
        Ok(self.channels[idx].player.output_mut())
    }

    /// Returns the stream link.
    pub fn link(&self) -> &K {
        &self.link
    }

    /// Returns the stream link mutably.
    pub fn link_mut(&mut self) -> &mut K {
        &mut self.link
    }

    /// Returns the number of channels.
    pub fn len(&self) -> usize {
        CHANNELS
    }

    /// Returns true if the set was built without channels.
    pub fn is_empty(&self) -> bool {
        CHANNELS == 0
    }

    fn index(id: ChannelId) -> Result<usize, ChannelError> {
        if id.0 < CHANNELS {
            Ok(id.0)
        } else {
            Err(ChannelError::InvalidChannelId(id))
        }
    }
}
