use std::fmt;

use qa_model::THRESHOLD_RANGE;

/// Confidence cutoff sent with `/api/ask`.
///
/// Stored as a step index from the range origin, so every value is on the
/// 0.05 grid and inside [0.20, 0.70].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Threshold {
    step: u8,
}

impl Threshold {
    /// Snaps `value` to the nearest grid step and clamps it into range.
    /// Non-finite input falls back to the default.
    pub fn new(value: f32) -> Self {
        if !value.is_finite() {
            return Self::default();
        }
        let raw = ((value - THRESHOLD_RANGE.min) / THRESHOLD_RANGE.step).round();
        let step = raw.clamp(0.0, f32::from(Self::max_step())) as u8;
        Self { step }
    }

    pub fn min() -> Self {
        Self { step: 0 }
    }

    pub fn max() -> Self {
        Self { step: Self::max_step() }
    }

    pub fn value(self) -> f32 {
        (min_cents() + u32::from(self.step) * step_cents()) as f32 / 100.0
    }

    /// Every selectable value, lowest first.
    pub fn all() -> impl Iterator<Item = Threshold> {
        (0..=Self::max_step()).map(|step| Threshold { step })
    }

    fn max_step() -> u8 {
        ((max_cents() - min_cents()) / step_cents()) as u8
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::new(THRESHOLD_RANGE.default)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

fn min_cents() -> u32 {
    (THRESHOLD_RANGE.min * 100.0).round() as u32
}

fn max_cents() -> u32 {
    (THRESHOLD_RANGE.max * 100.0).round() as u32
}

fn step_cents() -> u32 {
    (THRESHOLD_RANGE.step * 100.0).round() as u32
}
