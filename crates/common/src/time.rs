use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Engine time in milliseconds.
///
/// Serves as both a timestamp (milliseconds since loop start) and a frame
/// delta. Differences are never clamped here: a zero-length frame or a
/// multi-second gap after a debugger pause passes through arithmetic exactly
/// as observed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct TimeDelta(f64);

impl TimeDelta {
    pub const ZERO: TimeDelta = TimeDelta(0.0);

    /// From milliseconds.
    pub fn msec(ms: f64) -> Self {
        Self(ms)
    }

    /// From seconds.
    pub fn sec(s: f64) -> Self {
        Self(s * 1000.0)
    }

    /// Value in milliseconds.
    pub fn as_msec(self) -> f64 {
        self.0
    }

    /// Value in seconds.
    pub fn as_sec(self) -> f64 {
        self.0 / 1000.0
    }

    /// Value in seconds as f32, the form simulation math consumes.
    pub fn as_sec_f32(self) -> f32 {
        (self.0 / 1000.0) as f32
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for TimeDelta {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
