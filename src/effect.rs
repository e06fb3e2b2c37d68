use crate::colors::BLACK;
use crate::time::TimeDuration;
use crate::types::{Color, EffectError, EffectStep};
use heapless::Vec;

/// Substeps used for each ramp of a breathing effect.
const BREATH_SUBSTEPS: u16 = 10;

/// A looping or one-shot sequence of linear color ramps.
///
/// Each step ramps from the color the player currently emits to the step's
/// target color, so an effect never snaps when it replaces another one.
///
/// # Type Parameters
/// * `D` - The duration type (e.g., `embassy_time::Duration`)
/// * `N` - Maximum number of steps this effect can hold
#[derive(Debug, Clone, PartialEq)]
pub struct Effect<D: TimeDuration, const N: usize> {
    steps: Vec<EffectStep<D>, N>,
    looping: bool,
}

impl<D: TimeDuration, const N: usize> Effect<D, N> {
    /// Creates a new effect builder.
    pub fn builder() -> EffectBuilder<D, N> {
        EffectBuilder::new()
    }

    /// Creates a one-shot effect holding a single step.
    ///
    /// Stream steps are played through this wrapper.
    ///
    /// # Errors
    /// * `CapacityExceeded` - `N` is zero
    pub fn single(step: EffectStep<D>) -> Result<Self, EffectError> {
        let mut steps = Vec::new();
        steps.push(step).map_err(|_| EffectError::CapacityExceeded)?;

        Ok(Self {
            steps,
            looping: false,
        })
    }

    /// Solid color, reached on the first tick and held.
    pub fn on(color: Color) -> Result<Self, EffectError> {
        Self::single(EffectStep::new(color, 1, D::ZERO)?)
    }

    /// Output off.
    pub fn off() -> Result<Self, EffectError> {
        Self::on(BLACK)
    }

    /// Alternates between `color` and off, each held for `period`.
    pub fn blink(period: D, color: Color) -> Result<Self, EffectError> {
        Self::builder()
            .step(color, 1, period)?
            .step(BLACK, 1, period)?
            .looping(true)
            .build()
    }

    /// Ramps up to `color` over `period`, holds, ramps down, holds.
    pub fn breath(period: D, color: Color) -> Result<Self, EffectError> {
        let millis = period.as_millis();
        let substeps = u64::from(BREATH_SUBSTEPS);
        let ramp = D::from_millis(millis.div_ceil(substeps));

        Self::builder()
            .step(color, BREATH_SUBSTEPS, ramp)?
            .step(color, 1, period)?
            .step(BLACK, BREATH_SUBSTEPS, ramp)?
            .step(BLACK, 1, period)?
            .looping(true)
            .build()
    }

    /// Returns the steps of this effect.
    pub fn steps(&self) -> &[EffectStep<D>] {
        &self.steps
    }

    /// Returns the number of steps in this effect.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns a reference to the step at the given index.
    pub fn get_step(&self, index: usize) -> Option<&EffectStep<D>> {
        self.steps.get(index)
    }

    /// Returns true if the effect restarts after its last step.
    pub fn is_looping(&self) -> bool {
        self.looping
    }
}

/// Builder for constructing validated effects.
#[derive(Debug)]
pub struct EffectBuilder<D: TimeDuration, const N: usize> {
    steps: Vec<EffectStep<D>, N>,
    looping: bool,
}

impl<D: TimeDuration, const N: usize> EffectBuilder<D, N> {
    /// Creates a new empty effect builder.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            looping: false,
        }
    }

    /// Adds a ramp to `color` over `substep_count` ticks of `substep_duration`.
    ///
    /// # Errors
    /// * `ZeroSubsteps` - `substep_count` is zero
    /// * `CapacityExceeded` - the effect already holds `N` steps
    pub fn step(self, color: Color, substep_count: u16, substep_duration: D) -> Result<Self, EffectError> {
        self.push(EffectStep::new(color, substep_count, substep_duration)?)
    }

    /// Adds an already validated step.
    ///
    /// # Errors
    /// * `CapacityExceeded` - the effect already holds `N` steps
    pub fn push(mut self, step: EffectStep<D>) -> Result<Self, EffectError> {
        self.steps
            .push(step)
            .map_err(|_| EffectError::CapacityExceeded)?;
        Ok(self)
    }

    /// Sets whether the effect restarts after its last step.
    ///
    /// Default is `false`.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Builds and validates the effect.
    ///
    /// # Errors
    /// * `EmptyEffect` - No steps were added
    pub fn build(self) -> Result<Effect<D, N>, EffectError> {
        if self.steps.is_empty() {
            return Err(EffectError::EmptyEffect);
        }

        Ok(Effect {
            steps: self.steps,
            looping: self.looping,
        })
    }
}

impl<D: TimeDuration, const N: usize> Default for EffectBuilder<D, N> {
    fn default() -> Self {
        Self::new()
    }
}
