//! Behavioral biometrics: keystroke rhythm and mouse travel.
//!
//! The tracker is a two-state machine (idle / tracking) that owns two bounded
//! ring buffers. Input listeners are attached by the platform layer, which
//! forwards events through [`BiometricsTracker::record_keystroke`] and
//! [`BiometricsTracker::record_mouse_move`]; samples arriving while idle are
//! dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keystroke timestamps kept.
pub const KEYSTROKE_CAPACITY: usize = 20;

/// Mouse samples kept.
pub const MOUSE_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    Idle,
    Tracking,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseSample {
    pub x: f64,
    pub y: f64,
    /// Event timestamp in milliseconds
    pub t: f64,
}

/// Reduced biometrics attached to the outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BiometricsSummary {
    /// Mean interval between consecutive keystrokes (ms)
    pub avg_typing_speed: f64,
    /// Standard deviation of consecutive mouse travel distances (px)
    pub mouse_variance: f64,
}

/// Session-scoped input rhythm tracker. One per authentication form.
#[derive(Debug, Clone)]
pub struct BiometricsTracker {
    state: TrackerState,
    keystrokes: VecDeque<f64>,
    mouse: VecDeque<MouseSample>,
}

impl Default for BiometricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BiometricsTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            keystrokes: VecDeque::with_capacity(KEYSTROKE_CAPACITY),
            mouse: VecDeque::with_capacity(MOUSE_CAPACITY),
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == TrackerState::Tracking
    }

    /// idle -> tracking. Returns false if already tracking.
    pub fn start(&mut self) -> bool {
        if self.is_tracking() {
            return false;
        }
        self.state = TrackerState::Tracking;
        debug!("Biometrics tracking started");
        true
    }

    /// tracking -> idle. Buffers are kept for a final summary.
    pub fn stop(&mut self) -> bool {
        if !self.is_tracking() {
            return false;
        }
        self.state = TrackerState::Idle;
        debug!(
            keystrokes = self.keystrokes.len(),
            mouse_samples = self.mouse.len(),
            "Biometrics tracking stopped"
        );
        true
    }

    pub fn record_keystroke(&mut self, timestamp_ms: f64) {
        if !self.is_tracking() {
            return;
        }
        if self.keystrokes.len() == KEYSTROKE_CAPACITY {
            self.keystrokes.pop_front();
        }
        self.keystrokes.push_back(timestamp_ms);
    }

    pub fn record_mouse_move(&mut self, x: f64, y: f64, timestamp_ms: f64) {
        if !self.is_tracking() {
            return;
        }
        if self.mouse.len() == MOUSE_CAPACITY {
            self.mouse.pop_front();
        }
        self.mouse.push_back(MouseSample {
            x,
            y,
            t: timestamp_ms,
        });
    }

    pub fn keystroke_count(&self) -> usize {
        self.keystrokes.len()
    }

    pub fn mouse_sample_count(&self) -> usize {
        self.mouse.len()
    }

    /// Reduce the buffers to two scalars without draining them.
    ///
    /// Too little data yields 0 rather than NaN.
    pub fn summarize(&self) -> BiometricsSummary {
        let intervals: Vec<f64> = self
            .keystrokes
            .iter()
            .zip(self.keystrokes.iter().skip(1))
            .map(|(prev, next)| next - prev)
            .collect();

        let distances: Vec<f64> = self
            .mouse
            .iter()
            .zip(self.mouse.iter().skip(1))
            .map(|(a, b)| (b.x - a.x).hypot(b.y - a.y))
            .collect();

        BiometricsSummary {
            avg_typing_speed: mean(&intervals),
            mouse_variance: std_dev(&distances),
        }
    }
}

/// A recorded input event, as stored in replay files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    Keydown { t: f64 },
    Mousemove { x: f64, y: f64, t: f64 },
}

impl BiometricsTracker {
    /// Feed recorded events through a fresh tracking session.
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a InputEvent>) -> Self {
        let mut tracker = Self::new();
        tracker.start();
        for event in events {
            match *event {
                InputEvent::Keydown { t } => tracker.record_keystroke(t),
                InputEvent::Mousemove { x, y, t } => tracker.record_mouse_move(x, y, t),
            }
        }
        tracker.stop();
        tracker
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
