//! Per-channel effect playback.
//!
//! Provides [`EffectPlayer`] which walks a single output through an
//! [`Effect`] one substep per tick, and the [`LedOutput`] trait for hardware
//! abstraction. The player never sleeps on its own: every tick reports how
//! long to wait before the next one, so a caller can drive it from a
//! variable-period timer.

use crate::colors::BLACK;
use crate::effect::Effect;
use crate::time::TimeDuration;
use crate::types::{Color, approach};

/// Trait for abstracting indicator output hardware.
///
/// Implement this for your LED hardware (PWM, GPIO, SPI, etc.) to allow the
/// player to drive it.
pub trait LedOutput {
    /// Writes the color to the output.
    ///
    /// A failure marks the channel's output as unreliable; the player stops
    /// ticking until it is explicitly recovered.
    fn write(&mut self, color: Color) -> Result<(), OutputError>;
}

/// Returned by [`LedOutput::write`] when the hardware rejected the color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputError;

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "output write failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutputError {}

/// The current state of an effect player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerState {
    /// No effect. Output holds its last color.
    Idle,
    /// Effect in progress, ticks expected.
    Playing,
    /// One-shot effect reached its last step. Output holds the final color.
    Finished,
    /// An output write failed. No further ticks until recovered.
    Faulted,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome<D> {
    /// Tick again after this delay.
    Continue(D),
    /// The effect ran out of steps and does not loop.
    Finished,
}

/// Position within the playing effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    step_index: usize,
    substep_index: u16,
    color: Color,
}

impl PlaybackCursor {
    const fn new(color: Color) -> Self {
        Self {
            step_index: 0,
            substep_index: 0,
            color,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn substep_index(&self) -> u16 {
        self.substep_index
    }

    /// Last color written to the output.
    pub fn color(&self) -> Color {
        self.color
    }
}

/// Errors that can occur during player operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerError {
    /// Effect has no steps.
    EmptyEffect,
    /// Operation called from an invalid state.
    InvalidState {
        /// Human-readable description of expected state(s)
        expected: &'static str,
        /// The actual current state
        actual: PlayerState,
    },
    /// The output rejected a write.
    OutputWriteFailure,
}

impl core::fmt::Display for PlayerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlayerError::EmptyEffect => {
                write!(f, "effect must have at least one step")
            }
            PlayerError::InvalidState { expected, actual } => {
                write!(
                    f,
                    "invalid state: expected {}, but player is in {:?}",
                    expected, actual
                )
            }
            PlayerError::OutputWriteFailure => {
                write!(f, "output write failed")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlayerError {}

/// Drives a single output through an effect, one substep per tick.
///
/// # Type Parameters
/// * `D` - The duration type
/// * `L` - Output implementation type
/// * `N` - Maximum number of steps in effects
pub struct EffectPlayer<D: TimeDuration, L: LedOutput, const N: usize> {
    output: L,
    effect: Option<Effect<D, N>>,
    cursor: PlaybackCursor,
    state: PlayerState,
}

impl<D: TimeDuration, L: LedOutput, const N: usize> EffectPlayer<D, L, N> {
    /// Creates an idle player. The output is assumed to be off.
    pub fn new(output: L) -> Self {
        Self {
            output,
            effect: None,
            cursor: PlaybackCursor::new(BLACK),
            state: PlayerState::Idle,
        }
    }

    /// Starts an effect from its first step.
    ///
    /// The first ramp starts from the color currently on the output rather than
    /// from the effect's own colors, so switching effects never snaps.
    ///
    /// # Returns
    /// * `Ok(delay)` - Time until the first tick
    /// * `Err` - Empty effect or faulted output; the player is unchanged
    pub fn set_effect(&mut self, effect: Effect<D, N>) -> Result<D, PlayerError> {
        if self.state == PlayerState::Faulted {
            return Err(PlayerError::InvalidState {
                expected: "Idle, Playing, or Finished",
                actual: self.state,
            });
        }

        let first = effect.get_step(0).ok_or(PlayerError::EmptyEffect)?;
        let delay = first.substep_duration();

        self.cursor.step_index = 0;
        self.cursor.substep_index = 0;
        self.effect = Some(effect);
        self.state = PlayerState::Playing;
        Ok(delay)
    }

    /// Advances the effect by one substep and writes the new color.
    ///
    /// Must be called from `Playing` state.
    ///
    /// # Returns
    /// * `Ok(TickOutcome::Continue(delay))` - Tick again after `delay`
    /// * `Ok(TickOutcome::Finished)` - One-shot effect complete, transitions to `Finished`
    /// * `Err` - Invalid state, or the write failed and the player is now `Faulted`
    pub fn on_tick(&mut self) -> Result<TickOutcome<D>, PlayerError> {
        let effect = match (&self.effect, self.state) {
            (Some(effect), PlayerState::Playing) => effect,
            _ => {
                return Err(PlayerError::InvalidState {
                    expected: "Playing",
                    actual: self.state,
                });
            }
        };

        let steps = effect.steps();
        let step = &steps[self.cursor.step_index];
        let steps_left = step.substep_count() - self.cursor.substep_index;
        let color = approach(self.cursor.color, step.color(), steps_left);

        if self.output.write(color).is_err() {
            self.state = PlayerState::Faulted;
            return Err(PlayerError::OutputWriteFailure);
        }
        self.cursor.color = color;

        self.cursor.substep_index += 1;
        if self.cursor.substep_index == step.substep_count() {
            self.cursor.substep_index = 0;
            self.cursor.step_index += 1;

            if self.cursor.step_index == steps.len() {
                if effect.is_looping() {
                    self.cursor.step_index = 0;
                } else {
                    self.state = PlayerState::Finished;
                    return Ok(TickOutcome::Finished);
                }
            }
        }

        Ok(TickOutcome::Continue(
            steps[self.cursor.step_index].substep_duration(),
        ))
    }

    /// Drops the effect and turns the output off.
    ///
    /// Used when the peripheral powers down. A write failure leaves the player
    /// `Faulted`.
    pub fn stop(&mut self) -> Result<(), PlayerError> {
        self.effect = None;
        self.cursor = PlaybackCursor::new(self.cursor.color);

        if self.output.write(BLACK).is_err() {
            self.state = PlayerState::Faulted;
            return Err(PlayerError::OutputWriteFailure);
        }

        self.cursor.color = BLACK;
        self.state = PlayerState::Idle;
        Ok(())
    }

    /// Drops the effect. The output keeps its last color.
    pub fn clear(&mut self) {
        self.effect = None;
        self.cursor = PlaybackCursor::new(self.cursor.color);
        if self.state != PlayerState::Faulted {
            self.state = PlayerState::Idle;
        }
    }

    /// Clears a fault so effects can be played again.
    ///
    /// The effect is dropped; the caller decides what to play next.
    pub fn recover(&mut self) {
        self.effect = None;
        self.cursor = PlaybackCursor::new(self.cursor.color);
        self.state = PlayerState::Idle;
    }

    /// Returns the current state of the player.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Returns true if ticks are expected.
    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    /// Returns the playback position.
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// Returns the current color being displayed on the output.
    pub fn current_color(&self) -> Color {
        self.cursor.color
    }

    /// Returns a reference to the current effect, if any.
    pub fn effect(&self) -> Option<&Effect<D, N>> {
        self.effect.as_ref()
    }

    /// Returns the output.
    pub fn output(&self) -> &L {
        &self.output
    }

    /// Returns the output mutably.
    pub fn output_mut(&mut self) -> &mut L {
        &mut self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, GREEN, RED};
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TestDuration(u64);

    impl TimeDuration for TestDuration {
        const ZERO: Self = TestDuration(0);

        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            TestDuration(millis)
        }
    }

    // Mock output that records every write
    struct MockLed {
        history: Vec<Color, 64>,
        fail: bool,
    }

    impl MockLed {
        fn new() -> Self {
            Self {
                history: Vec::new(),
                fail: false,
            }
        }
    }

    impl LedOutput for MockLed {
        fn write(&mut self, color: Color) -> Result<(), OutputError> {
            if self.fail {
                return Err(OutputError);
            }
            let _ = self.history.push(color);
            Ok(())
        }
    }

    type Player = EffectPlayer<TestDuration, MockLed, 8>;

    fn gray(value: u8) -> Color {
        Color::new(value, value, value)
    }

    #[test]
    fn tick_requires_playing_state() {
        let mut player = Player::new(MockLed::new());

        let result = player.on_tick();
        assert!(matches!(result, Err(PlayerError::InvalidState { .. })));
    }

    #[test]
    fn set_effect_returns_first_substep_duration() {
        let mut player = Player::new(MockLed::new());
        let effect = Effect::builder()
            .step(RED, 3, TestDuration(40))
            .unwrap()
            .step(GREEN, 1, TestDuration(90))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(player.set_effect(effect), Ok(TestDuration(40)));
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn linear_ramp_has_no_drift() {
        let mut player = Player::new(MockLed::new());
        let effect = Effect::builder()
            .step(gray(100), 4, TestDuration(10))
            .unwrap()
            .build()
            .unwrap();
        player.set_effect(effect).unwrap();

        for _ in 0..3 {
            assert!(matches!(player.on_tick(), Ok(TickOutcome::Continue(_))));
        }
        assert_eq!(player.on_tick(), Ok(TickOutcome::Finished));

        assert_eq!(
            player.output().history.as_slice(),
            &[gray(25), gray(50), gray(75), gray(100)]
        );
        assert_eq!(player.state(), PlayerState::Finished);
    }

    #[test]
    fn tick_reports_duration_of_the_step_it_moved_into() {
        let mut player = Player::new(MockLed::new());
        let effect = Effect::builder()
            .step(RED, 1, TestDuration(10))
            .unwrap()
            .step(GREEN, 2, TestDuration(70))
            .unwrap()
            .step(BLUE, 1, TestDuration(5))
            .unwrap()
            .build()
            .unwrap();
        player.set_effect(effect).unwrap();

        assert_eq!(player.on_tick(), Ok(TickOutcome::Continue(TestDuration(70))));
        assert_eq!(player.on_tick(), Ok(TickOutcome::Continue(TestDuration(70))));
        assert_eq!(player.on_tick(), Ok(TickOutcome::Continue(TestDuration(5))));
        assert_eq!(player.on_tick(), Ok(TickOutcome::Finished));
    }

    #[test]
    fn new_effect_ramps_from_current_color() {
        let mut player = Player::new(MockLed::new());
        player
            .set_effect(Effect::on(gray(200)).unwrap())
            .unwrap();
        player.on_tick().unwrap();
        assert_eq!(player.current_color(), gray(200));

        let effect = Effect::builder()
            .step(gray(0), 2, TestDuration(10))
            .unwrap()
            .build()
            .unwrap();
        player.set_effect(effect).unwrap();
        player.on_tick().unwrap();

        assert_eq!(player.current_color(), gray(100));
    }

    #[test]
    fn looping_effect_returns_to_same_cursor_each_cycle() {
        let mut player = Player::new(MockLed::new());
        let effect = Effect::builder()
            .step(RED, 2, TestDuration(10))
            .unwrap()
            .step(BLUE, 3, TestDuration(10))
            .unwrap()
            .looping(true)
            .build()
            .unwrap();
        player.set_effect(effect).unwrap();

        // One full pass is 5 ticks; the first pass starts from black so compare
        // from the end of the first pass onward.
        for _ in 0..5 {
            player.on_tick().unwrap();
        }
        let reference = *player.cursor();
        assert_eq!(reference.step_index(), 0);
        assert_eq!(reference.substep_index(), 0);

        for _ in 0..3 {
            for _ in 0..5 {
                assert!(matches!(player.on_tick(), Ok(TickOutcome::Continue(_))));
            }
            assert_eq!(*player.cursor(), reference);
        }
    }

    #[test]
    fn write_failure_faults_player() {
        let mut player = Player::new(MockLed::new());
        player.set_effect(Effect::on(RED).unwrap()).unwrap();
        player.output_mut().fail = true;

        assert_eq!(player.on_tick(), Err(PlayerError::OutputWriteFailure));
        assert_eq!(player.state(), PlayerState::Faulted);
        assert_eq!(player.current_color(), BLACK);

        let result = player.set_effect(Effect::on(GREEN).unwrap());
        assert!(matches!(result, Err(PlayerError::InvalidState { .. })));

        player.output_mut().fail = false;
        player.recover();
        assert!(player.set_effect(Effect::on(GREEN).unwrap()).is_ok());
    }

    #[test]
    fn stop_turns_output_off() {
        let mut player = Player::new(MockLed::new());
        player.set_effect(Effect::on(RED).unwrap()).unwrap();
        player.on_tick().unwrap();

        player.stop().unwrap();

        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.current_color(), BLACK);
        assert_eq!(player.output().history.last(), Some(&BLACK));
        assert!(player.effect().is_none());
    }
}
