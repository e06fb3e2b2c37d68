//! Shared test infrastructure for led-streamer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use led_streamer::{
    Color, LedOutput, Notification, OutputError, StreamLink, TimeDuration, TimeInstant,
    TimeSource,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        self.0.checked_add(duration.0).map(TestInstant)
    }
}

// ============================================================================
// Mock LED
// ============================================================================

/// Mock LED that records every written color
pub struct MockLed {
    color_history: heapless::Vec<Color, 64>,
    fail: bool,
}

impl MockLed {
    pub fn new() -> Self {
        Self {
            color_history: heapless::Vec::new(),
            fail: false,
        }
    }

    pub fn color_history(&self) -> &[Color] {
        &self.color_history
    }

    pub fn last_color(&self) -> Option<Color> {
        self.color_history.last().copied()
    }

    /// Makes subsequent writes fail (or succeed again)
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }

    pub fn clear_history(&mut self) {
        self.color_history.clear();
    }
}

impl LedOutput for MockLed {
    fn write(&mut self, color: Color) -> Result<(), OutputError> {
        if self.fail {
            return Err(OutputError);
        }
        let _ = self.color_history.push(color);
        Ok(())
    }
}

// ============================================================================
// Mock Link
// ============================================================================

/// Mock stream link recording notifications and latency requests
#[derive(Default)]
pub struct MockLink {
    pub notifications: heapless::Vec<Notification, 64>,
    pub latency_requests: heapless::Vec<bool, 16>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| matches!(n, Notification::ReadyForNextStep { .. }))
            .count()
    }
}

impl StreamLink for MockLink {
    fn notify(&mut self, notification: Notification) {
        let _ = self.notifications.push(notification);
    }

    fn set_low_latency(&mut self, low_latency: bool) {
        let _ = self.latency_requests.push(low_latency);
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

pub fn gray(value: u8) -> Color {
    Color::new(value, value, value)
}
