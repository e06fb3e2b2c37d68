//! Core types for effect construction.

use crate::time::TimeDuration;
use palette::Srgb;

/// An 8-bit RGB color as emitted to an output channel.
pub type Color = Srgb<u8>;

/// A single linear ramp within an effect.
///
/// The player moves from whatever color it currently emits to `color` over
/// `substep_count` ticks, waiting `substep_duration` between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectStep<D: TimeDuration> {
    color: Color,
    substep_count: u16,
    substep_duration: D,
}

impl<D: TimeDuration> EffectStep<D> {
    /// Creates a new effect step.
    ///
    /// # Errors
    /// * `ZeroSubsteps` - `substep_count` is zero
    #[inline]
    pub fn new(color: Color, substep_count: u16, substep_duration: D) -> Result<Self, EffectError> {
        if substep_count == 0 {
            return Err(EffectError::ZeroSubsteps);
        }

        Ok(Self {
            color,
            substep_count,
            substep_duration,
        })
    }

    /// Target color.
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Number of ticks the ramp takes. Always at least one.
    #[inline]
    pub fn substep_count(&self) -> u16 {
        self.substep_count
    }

    /// Time between ticks.
    #[inline]
    pub fn substep_duration(&self) -> D {
        self.substep_duration
    }
}

/// Effect validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectError {
    /// No steps provided.
    EmptyEffect,

    /// A step with zero substeps.
    ZeroSubsteps,

    /// Effect capacity exceeded.
    CapacityExceeded,
}

impl core::fmt::Display for EffectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EffectError::EmptyEffect => {
                write!(f, "effect must have at least one step")
            }
            EffectError::ZeroSubsteps => {
                write!(f, "effect step must have at least one substep")
            }
            EffectError::CapacityExceeded => {
                write!(f, "effect capacity exceeded")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EffectError {}

/// Moves `from` one tick closer to `to` when `steps_left` ticks remain.
///
/// Truncates toward zero and lands exactly on `to` when `steps_left == 1`.
#[inline]
pub(crate) fn approach(from: Color, to: Color, steps_left: u16) -> Color {
    let steps_left = i32::from(steps_left.max(1));
    let component = |from: u8, to: u8| -> u8 {
        let diff = (i32::from(to) - i32::from(from)) / steps_left;
        (i32::from(from) + diff) as u8
    };

    Color::new(
        component(from.red, to.red),
        component(from.green, to.green),
        component(from.blue, to.blue),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Ms(u64);

    impl TimeDuration for Ms {
        const ZERO: Self = Ms(0);

        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            Ms(millis)
        }
    }

    #[test]
    fn step_rejects_zero_substeps() {
        let result = EffectStep::new(Color::new(1, 2, 3), 0, Ms(10));
        assert_eq!(result, Err(EffectError::ZeroSubsteps));
    }

    #[test]
    fn approach_lands_on_target_at_last_substep() {
        let from = Color::new(0, 255, 7);
        let to = Color::new(255, 0, 3);
        assert_eq!(approach(from, to, 1), to);
    }

    #[test]
    fn approach_truncates_toward_zero_in_both_directions() {
        let from = Color::new(0, 100, 50);
        let to = Color::new(10, 90, 50);
        // 10 / 3 = 3, -10 / 3 = -3
        assert_eq!(approach(from, to, 3), Color::new(3, 97, 50));
    }
}
