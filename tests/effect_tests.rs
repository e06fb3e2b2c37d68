//! Integration tests for Effect construction and presets

mod common;
use common::*;

use led_streamer::{BLACK, Effect, EffectError, EffectStep, RED};

#[test]
fn builder_rejects_empty_effect() {
    let result = Effect::<TestDuration, 8>::builder().build();
    assert!(matches!(result, Err(EffectError::EmptyEffect)));
}

#[test]
fn builder_rejects_zero_substeps() {
    let result = Effect::<TestDuration, 8>::builder().step(RED, 0, TestDuration(10));
    assert!(matches!(result, Err(EffectError::ZeroSubsteps)));
}

#[test]
fn builder_reports_capacity_exceeded() {
    let result = Effect::<TestDuration, 1>::builder()
        .step(RED, 1, TestDuration(10))
        .unwrap()
        .step(BLACK, 1, TestDuration(10));
    assert!(matches!(result, Err(EffectError::CapacityExceeded)));
}

#[test]
fn builder_keeps_step_order_and_loop_flag() {
    let effect = Effect::<TestDuration, 4>::builder()
        .step(RED, 3, TestDuration(20))
        .unwrap()
        .step(gray(7), 1, TestDuration(5))
        .unwrap()
        .looping(true)
        .build()
        .unwrap();

    assert_eq!(effect.step_count(), 2);
    assert!(effect.is_looping());
    let first = effect.get_step(0).unwrap();
    assert_eq!(first.color(), RED);
    assert_eq!(first.substep_count(), 3);
    assert_eq!(first.substep_duration(), TestDuration(20));
    assert_eq!(effect.get_step(1).unwrap().color(), gray(7));
    assert!(effect.get_step(2).is_none());
}

#[test]
fn single_wraps_one_shot_step() {
    let step = EffectStep::new(gray(10), 2, TestDuration(50)).unwrap();
    let effect = Effect::<TestDuration, 1>::single(step).unwrap();

    assert_eq!(effect.steps(), &[step]);
    assert!(!effect.is_looping());
}

#[test]
fn single_requires_capacity_of_at_least_one() {
    let step = EffectStep::new(gray(10), 2, TestDuration(50)).unwrap();
    let result = Effect::<TestDuration, 0>::single(step);
    assert!(matches!(result, Err(EffectError::CapacityExceeded)));
}

#[test]
fn on_and_off_are_single_immediate_steps() {
    let on = Effect::<TestDuration, 1>::on(RED).unwrap();
    assert_eq!(on.step_count(), 1);
    assert_eq!(on.get_step(0).unwrap().substep_count(), 1);
    assert_eq!(on.get_step(0).unwrap().substep_duration(), TestDuration(0));
    assert!(!on.is_looping());

    let off = Effect::<TestDuration, 1>::off().unwrap();
    assert_eq!(off.get_step(0).unwrap().color(), BLACK);
}

#[test]
fn blink_alternates_color_and_off() {
    let blink = Effect::<TestDuration, 2>::blink(TestDuration(200), RED).unwrap();

    assert!(blink.is_looping());
    let colors: Vec<_> = blink.steps().iter().map(|s| s.color()).collect();
    assert_eq!(colors, [RED, BLACK]);
    assert!(
        blink
            .steps()
            .iter()
            .all(|s| s.substep_duration() == TestDuration(200))
    );
}

#[test]
fn breath_ramps_up_holds_and_ramps_down() {
    let breath = Effect::<TestDuration, 4>::breath(TestDuration(1000), gray(100)).unwrap();

    assert!(breath.is_looping());
    let steps = breath.steps();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0].color(), gray(100));
    assert_eq!(steps[0].substep_count(), 10);
    assert_eq!(steps[0].substep_duration(), TestDuration(100));
    assert_eq!(steps[1].substep_duration(), TestDuration(1000));
    assert_eq!(steps[2].color(), BLACK);
    assert_eq!(steps[3].color(), BLACK);
}

#[test]
fn breath_rounds_ramp_substep_up() {
    let breath = Effect::<TestDuration, 4>::breath(TestDuration(25), RED).unwrap();
    assert_eq!(breath.steps()[0].substep_duration(), TestDuration(3));
}

#[test]
fn breath_needs_four_steps() {
    let result = Effect::<TestDuration, 3>::breath(TestDuration(1000), RED);
    assert!(matches!(result, Err(EffectError::CapacityExceeded)));
}
